//! Check conduction between parents and children.

use indexmap::IndexSet;
use log::warn;

use super::KeyEntities;
use crate::key::Key;

/// Direction of a conduction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckedState {
    /// Fill: checked keys spread down to descendants and up to parents whose
    /// children are all checked.
    Checked,
    /// Clean: keys missing from the input are cleared from their descendants
    /// and from parents that are no longer fully checked.
    Unchecked {
        /// Half-checked keys from the previous fill pass.
        half_checked_keys: Vec<Key>,
    },
}

/// Output of [`conduct_check`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConductResult {
    /// Fully checked keys: input keys first, then keys added by conduction.
    pub checked_keys: Vec<Key>,
    /// Keys with some but not all eligible descendants checked.
    pub half_checked_keys: Vec<Key>,
}

/// Make a checked key set consistent with the tree.
///
/// Disabled nodes are never toggled by conduction and do not take part in
/// their parent's "all children checked" test. A parent whose children are
/// all disabled is never forced checked by them.
///
/// Keys not present in `entities` are dropped with a warning.
///
/// # Example
///
/// ```
/// use gridstate::{CheckedState, Key, KeyEntities, conduct_check};
///
/// let mut tree = KeyEntities::new();
/// tree.add(Key::from("A"), None);
/// tree.add(Key::from("A1"), Some(&Key::from("A")));
/// tree.add(Key::from("A2"), Some(&Key::from("A")));
///
/// let result = conduct_check(&[Key::from("A1")], &CheckedState::Checked, &tree, |_| false);
/// assert_eq!(result.checked_keys, vec![Key::from("A1")]);
/// assert_eq!(result.half_checked_keys, vec![Key::from("A")]);
/// ```
pub fn conduct_check<F>(
    keys: &[Key],
    state: &CheckedState,
    entities: &KeyEntities,
    is_disabled: F,
) -> ConductResult
where
    F: Fn(&Key) -> bool,
{
    let mut missing = Vec::new();
    let checked: IndexSet<Key> = keys
        .iter()
        .filter(|key| {
            let present = entities.contains(key);
            if !present {
                missing.push((*key).clone());
            }
            present
        })
        .cloned()
        .collect();

    if !missing.is_empty() {
        warn!("Tree data does not contain keys {:?}, ignored", missing);
    }

    match state {
        CheckedState::Checked => fill_conduct(checked, entities, &is_disabled),
        CheckedState::Unchecked { half_checked_keys } => {
            clean_conduct(checked, half_checked_keys, entities, &is_disabled)
        }
    }
}

fn fill_conduct<F>(mut checked: IndexSet<Key>, entities: &KeyEntities, is_disabled: &F) -> ConductResult
where
    F: Fn(&Key) -> bool,
{
    let max_level = entities.max_level();

    // Top to bottom: a checked node checks its enabled children.
    for level in 0..=max_level {
        for key in entities.level(level) {
            if !checked.contains(key) || is_disabled(key) {
                continue;
            }
            let Some(entity) = entities.get(key) else {
                continue;
            };
            for child in entity.children.iter().filter(|c| !is_disabled(c)) {
                checked.insert(child.clone());
            }
        }
    }

    let mut half = IndexSet::new();
    roll_up(&mut checked, &mut half, entities, is_disabled, true);
    finish(checked, half)
}

fn clean_conduct<F>(
    mut checked: IndexSet<Key>,
    half_keys: &[Key],
    entities: &KeyEntities,
    is_disabled: &F,
) -> ConductResult
where
    F: Fn(&Key) -> bool,
{
    let previous_half: IndexSet<Key> = half_keys.iter().cloned().collect();
    let max_level = entities.max_level();

    // Top to bottom: an unchecked, non-half node clears its enabled children.
    for level in 0..=max_level {
        for key in entities.level(level) {
            if checked.contains(key) || previous_half.contains(key) || is_disabled(key) {
                continue;
            }
            let Some(entity) = entities.get(key) else {
                continue;
            };
            for child in entity.children.iter().filter(|c| !is_disabled(c)) {
                checked.shift_remove(child);
            }
        }
    }

    let mut half = IndexSet::new();
    roll_up(&mut checked, &mut half, entities, is_disabled, false);
    finish(checked, half)
}

/// Bottom to top: recompute each parent from its enabled children.
///
/// In fill mode a parent with all enabled children checked becomes checked;
/// in clean mode a parent without all enabled children checked is cleared.
/// Either way a parent with any checked or half-checked child is half-checked.
fn roll_up<F>(
    checked: &mut IndexSet<Key>,
    half: &mut IndexSet<Key>,
    entities: &KeyEntities,
    is_disabled: &F,
    fill: bool,
) where
    F: Fn(&Key) -> bool,
{
    let mut visited: IndexSet<Key> = IndexSet::new();

    for level in (0..=entities.max_level()).rev() {
        for key in entities.level(level) {
            if is_disabled(key) {
                continue;
            }
            let Some(parent_key) = entities.get(key).and_then(|e| e.parent.as_ref()) else {
                continue;
            };
            if visited.contains(parent_key) {
                continue;
            }
            visited.insert(parent_key.clone());
            if is_disabled(parent_key) {
                continue;
            }
            let Some(parent) = entities.get(parent_key) else {
                continue;
            };

            let mut all_checked = true;
            let mut partial_checked = false;
            for child in parent.children.iter().filter(|c| !is_disabled(c)) {
                let child_checked = checked.contains(child);
                if !child_checked {
                    all_checked = false;
                }
                if child_checked || half.contains(child) {
                    partial_checked = true;
                }
            }

            if fill && all_checked {
                checked.insert(parent_key.clone());
            }
            if !fill && !all_checked {
                checked.shift_remove(parent_key);
            }
            if partial_checked {
                half.insert(parent_key.clone());
            }
        }
    }
}

fn finish(checked: IndexSet<Key>, half: IndexSet<Key>) -> ConductResult {
    let half_checked_keys = half.into_iter().filter(|k| !checked.contains(k)).collect();
    ConductResult {
        checked_keys: checked.into_iter().collect(),
        half_checked_keys,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn k(s: &str) -> Key {
        Key::from(s)
    }

    /// A -> [A1, A2], B -> [B1 -> [B1a, B1b], B2]
    fn tree() -> KeyEntities {
        let mut t = KeyEntities::new();
        t.add(k("A"), None);
        t.add(k("A1"), Some(&k("A")));
        t.add(k("A2"), Some(&k("A")));
        t.add(k("B"), None);
        t.add(k("B1"), Some(&k("B")));
        t.add(k("B1a"), Some(&k("B1")));
        t.add(k("B1b"), Some(&k("B1")));
        t.add(k("B2"), Some(&k("B")));
        t
    }

    fn set(keys: &[Key]) -> HashSet<Key> {
        keys.iter().cloned().collect()
    }

    fn never(_: &Key) -> bool {
        false
    }

    #[test]
    fn test_check_child_marks_parent_half() {
        let t = tree();
        let result = conduct_check(&[k("A1")], &CheckedState::Checked, &t, never);
        assert_eq!(result.checked_keys, vec![k("A1")]);
        assert_eq!(result.half_checked_keys, vec![k("A")]);
    }

    #[test]
    fn test_check_all_children_checks_parent() {
        let t = tree();
        let result = conduct_check(&[k("A1"), k("A2")], &CheckedState::Checked, &t, never);
        assert_eq!(result.checked_keys, vec![k("A1"), k("A2"), k("A")]);
        assert!(result.half_checked_keys.is_empty());
    }

    #[test]
    fn test_check_parent_cascades_down() {
        let t = tree();
        let result = conduct_check(&[k("B")], &CheckedState::Checked, &t, never);
        assert_eq!(
            set(&result.checked_keys),
            set(&[k("B"), k("B1"), k("B2"), k("B1a"), k("B1b")])
        );
    }

    #[test]
    fn test_deep_leaf_half_checks_every_ancestor() {
        let t = tree();
        let result = conduct_check(&[k("B1a")], &CheckedState::Checked, &t, never);
        assert_eq!(set(&result.half_checked_keys), set(&[k("B1"), k("B")]));
    }

    #[test]
    fn test_disabled_child_does_not_block_parent() {
        let t = tree();
        let disabled = |key: &Key| key == &k("A2");
        let result = conduct_check(&[k("A1")], &CheckedState::Checked, &t, disabled);
        assert!(result.checked_keys.contains(&k("A")));
        assert!(!result.checked_keys.contains(&k("A2")));
    }

    #[test]
    fn test_disabled_child_not_toggled_by_parent() {
        let t = tree();
        let disabled = |key: &Key| key == &k("A2");
        let result = conduct_check(&[k("A")], &CheckedState::Checked, &t, disabled);
        assert!(result.checked_keys.contains(&k("A1")));
        assert!(!result.checked_keys.contains(&k("A2")));
    }

    #[test]
    fn test_disabled_only_children_never_force_parent() {
        let t = tree();
        let disabled = |key: &Key| key == &k("A1") || key == &k("A2");
        let result = conduct_check(&[], &CheckedState::Checked, &t, disabled);
        assert!(result.checked_keys.is_empty());
        assert!(result.half_checked_keys.is_empty());
    }

    #[test]
    fn test_uncheck_cascades_and_recomputes_ancestors() {
        let t = tree();
        let filled = conduct_check(&[k("B")], &CheckedState::Checked, &t, never);

        let remaining: Vec<Key> = filled
            .checked_keys
            .iter()
            .filter(|key| **key != k("B1"))
            .cloned()
            .collect();
        let cleaned = conduct_check(
            &remaining,
            &CheckedState::Unchecked {
                half_checked_keys: filled.half_checked_keys.clone(),
            },
            &t,
            never,
        );

        assert_eq!(set(&cleaned.checked_keys), set(&[k("B2")]));
        assert_eq!(cleaned.half_checked_keys, vec![k("B")]);
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let t = tree();
        let result = conduct_check(&[k("nope"), k("A1")], &CheckedState::Checked, &t, never);
        assert_eq!(result.checked_keys, vec![k("A1")]);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let t = tree();
        let inputs = [
            vec![k("A1")],
            vec![k("B1a"), k("B2")],
            vec![k("B1a"), k("B1b"), k("A2")],
            vec![k("A"), k("B1")],
        ];
        for input in inputs {
            let first = conduct_check(&input, &CheckedState::Checked, &t, never);
            let second = conduct_check(&first.checked_keys, &CheckedState::Checked, &t, never);
            assert_eq!(set(&first.checked_keys), set(&second.checked_keys));
            assert_eq!(set(&first.half_checked_keys), set(&second.half_checked_keys));
        }
    }
}
