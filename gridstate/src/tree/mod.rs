//! Key entity arena and check conduction for tree-shaped rows.
//!
//! Parent/child relations are stored as keys into one arena rather than as
//! references, and the arena is rebuilt whenever the row tree changes.

mod conduct;

use std::collections::HashMap;

use log::warn;

use crate::key::{Key, RowKeyFn};
use crate::record::TableRecord;
use crate::registry::walk_rows;

pub use conduct::{CheckedState, ConductResult, conduct_check};

/// One node of the key tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntity {
    pub key: Key,
    pub parent: Option<Key>,
    pub children: Vec<Key>,
    /// Depth in the tree (0 = root).
    pub level: usize,
}

/// Arena of [`KeyEntity`] nodes addressed by key.
#[derive(Debug, Clone, Default)]
pub struct KeyEntities {
    entities: HashMap<Key, KeyEntity>,
    /// Keys grouped by level, each level in insertion order.
    levels: Vec<Vec<Key>>,
}

impl KeyEntities {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the arena from a row tree.
    ///
    /// Rows without a key are skipped together with their subtree.
    pub fn from_rows<R: TableRecord>(
        rows: &[R],
        children_column: &str,
        row_key: &RowKeyFn<R>,
    ) -> Self {
        let mut entities = Self::new();
        // Key of the most recent row seen at each depth, `None` if that row had no key.
        let mut path: Vec<Option<Key>> = Vec::new();

        walk_rows(rows, children_column, &mut |row, index, depth| {
            path.truncate(depth);
            let parent = match depth {
                0 => None,
                _ => match path.get(depth - 1) {
                    Some(Some(parent)) => Some(parent.clone()),
                    _ => {
                        path.push(None);
                        return;
                    }
                },
            };

            match row_key(row, index) {
                Some(key) => {
                    entities.add(key.clone(), parent.as_ref());
                    path.push(Some(key));
                }
                None => {
                    warn!("Row {} at depth {} has no row key, excluded from tree", index, depth);
                    path.push(None);
                }
            }
        });

        entities
    }

    /// Add a node under `parent` (or as a root).
    ///
    /// A key that is already present is replaced, and a parent that is not
    /// present makes the node a root.
    pub fn add(&mut self, key: Key, parent: Option<&Key>) {
        if self.entities.contains_key(&key) {
            warn!("Duplicate tree key {}, replacing earlier entity", key);
            self.remove_from_levels(&key);
        }

        let parent = parent.filter(|p| self.entities.contains_key(*p)).cloned();
        let level = parent
            .as_ref()
            .and_then(|p| self.entities.get(p))
            .map(|p| p.level + 1)
            .unwrap_or(0);

        if let Some(parent_key) = &parent {
            if let Some(parent_entity) = self.entities.get_mut(parent_key) {
                if !parent_entity.children.contains(&key) {
                    parent_entity.children.push(key.clone());
                }
            }
        }

        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(key.clone());

        self.entities.insert(
            key.clone(),
            KeyEntity {
                key,
                parent,
                children: Vec::new(),
                level,
            },
        );
    }

    fn remove_from_levels(&mut self, key: &Key) {
        for level in &mut self.levels {
            level.retain(|k| k != key);
        }
    }

    pub fn get(&self, key: &Key) -> Option<&KeyEntity> {
        self.entities.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entities.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Deepest level present (0 for an empty or flat tree).
    pub fn max_level(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Keys at a level in insertion order.
    pub fn level(&self, level: usize) -> &[Key] {
        self.levels.get(level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Walk from a node's parent up to its root.
    pub fn ancestors(&self, key: &Key) -> Vec<Key> {
        let mut result = Vec::new();
        let mut current = self.get(key).and_then(|e| e.parent.clone());
        while let Some(parent) = current {
            current = self.get(&parent).and_then(|e| e.parent.clone());
            result.push(parent);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::row_key_by_field;
    use crate::record::Record;

    #[test]
    fn test_from_rows_links_parents() {
        let rows = Record::list_from_json(
            &serde_json::json!([
                {"key": "a", "children": [{"key": "a1", "children": [{"key": "a1x"}]}, {"key": "a2"}]},
                {"key": "b"}
            ]),
            "children",
        );
        let entities = KeyEntities::from_rows(&rows, "children", &row_key_by_field("key"));

        assert_eq!(entities.len(), 5);
        assert_eq!(entities.max_level(), 2);
        assert_eq!(entities.level(0), &[Key::from("a"), Key::from("b")]);

        let a = entities.get(&Key::from("a")).unwrap();
        assert_eq!(a.children, vec![Key::from("a1"), Key::from("a2")]);
        assert_eq!(
            entities.ancestors(&Key::from("a1x")),
            vec![Key::from("a1"), Key::from("a")]
        );
    }

    #[test]
    fn test_keyless_subtree_is_skipped() {
        let rows = Record::list_from_json(
            &serde_json::json!([
                {"name": "no key", "children": [{"key": "lost"}]},
                {"key": "b"}
            ]),
            "children",
        );
        let entities = KeyEntities::from_rows(&rows, "children", &row_key_by_field("key"));
        assert!(!entities.contains(&Key::from("lost")));
        assert!(entities.contains(&Key::from("b")));
    }

    #[test]
    fn test_add_with_unknown_parent_is_root() {
        let mut entities = KeyEntities::new();
        entities.add(Key::from(1), Some(&Key::from(99)));
        assert_eq!(entities.get(&Key::from(1)).unwrap().level, 0);
        assert_eq!(entities.get(&Key::from(1)).unwrap().parent, None);
    }
}
