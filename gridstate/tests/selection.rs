use std::sync::{Arc, Mutex};

use gridstate::prelude::*;
use gridstate::{CheckedState, KeyEntities, SelectionInfo, conduct_check};
use simplelog::{Config, LevelFilter, TestLogger};

type Changes = Arc<Mutex<Vec<(Vec<Key>, Vec<Record>, SelectionInfo)>>>;

fn init_logger() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}

fn flat_rows(n: i64) -> Vec<Record> {
    (1..=n)
        .map(|i| Record::new().set("key", i).set("name", format!("row {}", i)))
        .collect()
}

fn tree_rows() -> Vec<Record> {
    Record::list_from_json(
        &serde_json::json!([
            {"key": "A", "children": [{"key": "A1"}, {"key": "A2"}]},
            {"key": "B", "children": [
                {"key": "B1", "children": [{"key": "B1a"}, {"key": "B1b"}]},
                {"key": "B2"}
            ]},
            {"key": "C"}
        ]),
        "children",
    )
}

fn columns() -> Vec<ColumnDescriptor<Record>> {
    vec![Column::new("Name").data_index("name").into()]
}

fn capture(selection: RowSelection<Record>) -> (RowSelection<Record>, Changes) {
    let changes: Changes = Arc::new(Mutex::new(Vec::new()));
    let seen = changes.clone();
    let selection = selection.on_change(move |keys, rows, info| {
        seen.lock().unwrap().push((keys.to_vec(), rows.to_vec(), info));
    });
    (selection, changes)
}

fn table(rows: Vec<Record>, selection: RowSelection<Record>) -> TableState<Record> {
    init_logger();
    TableState::new(TableConfig::new(columns()).row_selection(selection), rows).unwrap()
}

fn keys(ids: &[i64]) -> Vec<Key> {
    ids.iter().map(|i| Key::from(*i)).collect()
}

fn str_keys(ids: &[&str]) -> Vec<Key> {
    ids.iter().map(|s| Key::from(*s)).collect()
}

fn sorted(keys: impl IntoIterator<Item = Key>) -> Vec<Key> {
    let mut keys: Vec<Key> = keys.into_iter().collect();
    keys.sort();
    keys
}

// ============================================================================
// Tree Conduction
// ============================================================================

#[test]
fn test_conduction_is_idempotent() {
    let rows = tree_rows();
    let entities = KeyEntities::from_rows(&rows, "children", &gridstate::row_key_by_field("key"));
    let never = |_: &Key| false;

    for start in [
        str_keys(&["A1"]),
        str_keys(&["B1a", "A2"]),
        str_keys(&["B"]),
        str_keys(&["B1a", "B1b", "B2", "C"]),
        Vec::new(),
    ] {
        let first = conduct_check(&start, &CheckedState::Checked, &entities, never);
        let second = conduct_check(&first.checked_keys, &CheckedState::Checked, &entities, never);
        assert_eq!(sorted(first.checked_keys.clone()), sorted(second.checked_keys));
        assert_eq!(sorted(first.half_checked_keys), sorted(second.half_checked_keys));
    }
}

#[test]
fn test_conduction_skips_disabled_children() {
    let rows = tree_rows();
    let entities = KeyEntities::from_rows(&rows, "children", &gridstate::row_key_by_field("key"));
    let disabled = |key: &Key| key == &Key::from("B2");

    let result = conduct_check(&str_keys(&["B1"]), &CheckedState::Checked, &entities, disabled);
    assert!(result.checked_keys.contains(&Key::from("B")));
    assert!(!result.checked_keys.contains(&Key::from("B2")));
}

#[test]
fn test_tree_selection_reports_half_checked_parent() {
    let (selection, changes) = capture(RowSelection::new().check_strictly(false));
    let mut table = table(tree_rows(), selection);

    table.click_row(&Key::from("B1a"), Modifiers::NONE);
    assert_eq!(sorted(table.selected_keys()), str_keys(&["B1a"]));
    assert_eq!(sorted(table.half_selected_keys()), str_keys(&["B", "B1"]));

    table.click_row(&Key::from("B1b"), Modifiers::NONE);
    assert_eq!(sorted(table.selected_keys()), str_keys(&["B1", "B1a", "B1b"]));
    assert_eq!(sorted(table.half_selected_keys()), str_keys(&["B"]));

    let changes = changes.lock().unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[1].2.method, RowSelectMethod::Single);
    assert_eq!(changes[1].1.len(), 3);
}

#[test]
fn test_tree_cell_shows_indeterminate() {
    let mut table = table(tree_rows(), RowSelection::new().check_strictly(false));
    table.click_row(&Key::from("A1"), Modifiers::NONE);

    let selection = table.selection().unwrap();
    let rows = table.page_rows();
    let parent = selection.cell(&rows[0], 0);
    assert!(!parent.checked);
    assert!(parent.indeterminate);
}

#[test]
fn test_strict_mode_does_not_conduct() {
    let mut table = table(tree_rows(), RowSelection::new());
    table.click_row(&Key::from("A1"), Modifiers::NONE);
    table.click_row(&Key::from("A2"), Modifiers::NONE);
    assert_eq!(sorted(table.selected_keys()), str_keys(&["A1", "A2"]));
    assert!(table.half_selected_keys().is_empty());
}

// ============================================================================
// Controlled Keys
// ============================================================================

#[test]
fn test_controlled_keys_are_canonical() {
    let (selection, changes) = capture(RowSelection::new().selected_row_keys(keys(&[1])));
    let mut table = table(flat_rows(5), selection);

    table.click_row(&Key::from(3), Modifiers::NONE);
    table.click_select_all();
    assert_eq!(sorted(table.selected_keys()), keys(&[1]));

    let changes = changes.lock().unwrap();
    assert_eq!(changes[0].0, keys(&[1, 3]));
    assert_eq!(changes[1].2.method, RowSelectMethod::All);
}

#[test]
fn test_controlled_keys_follow_host_updates() {
    let mut table = table(flat_rows(5), RowSelection::new().selected_row_keys(keys(&[1])));
    table.set_selected_row_keys(Some(keys(&[2, 4])));
    assert_eq!(sorted(table.selected_keys()), keys(&[2, 4]));

    table.set_selected_row_keys(None);
    table.click_row(&Key::from(5), Modifiers::NONE);
    assert_eq!(sorted(table.selected_keys()), keys(&[5]));
}

// ============================================================================
// Bulk Operations
// ============================================================================

#[test]
fn test_select_all_applies_to_current_page_only() {
    init_logger();
    let config = TableConfig::new(columns())
        .row_selection(RowSelection::new().default_selected_row_keys(keys(&[12])))
        .pagination(PaginationConfig::default().default_page_size(5));
    let mut table = TableState::new(config, flat_rows(12)).unwrap();

    table.select_all_on_page(true);
    assert_eq!(sorted(table.selected_keys()), keys(&[1, 2, 3, 4, 5, 12]));

    table.select_all_on_page(false);
    assert_eq!(sorted(table.selected_keys()), keys(&[12]));
}

#[test]
fn test_disabled_rows_excluded_from_bulk_operations() {
    let selection = RowSelection::new()
        .default_selected_row_keys(keys(&[2]))
        .checkbox_props(|row: &Record| match row.get("key").and_then(Value::as_i64) {
            Some(2) | Some(3) => CheckboxProps::disabled(),
            _ => CheckboxProps::default(),
        });
    let mut table = table(flat_rows(4), selection);

    table.click_select_all();
    assert_eq!(sorted(table.selected_keys()), keys(&[1, 2, 4]));

    table.invert_page_selection();
    assert_eq!(sorted(table.selected_keys()), keys(&[2]));

    table.select_all_data();
    assert_eq!(sorted(table.selected_keys()), keys(&[1, 2, 4]));

    table.clear_selection();
    assert_eq!(sorted(table.selected_keys()), keys(&[2]));
}

#[test]
fn test_builtin_menu_runs_items() {
    let none_calls = Arc::new(Mutex::new(0));
    let seen = none_calls.clone();
    let selection = RowSelection::new()
        .selections(Selections::Builtin)
        .on_select_none(move || *seen.lock().unwrap() += 1);
    let mut table = table(flat_rows(3), selection);

    let menu: Vec<String> = table.selection_items().into_iter().map(|m| m.key).collect();
    assert_eq!(menu, vec!["all", "invert", "none"]);

    assert!(table.run_selection_item("all"));
    assert_eq!(table.selected_keys().len(), 3);
    assert!(table.run_selection_item("none"));
    assert!(table.selected_keys().is_empty());
    assert_eq!(*none_calls.lock().unwrap(), 1);
    assert!(!table.run_selection_item("missing"));
}

#[test]
fn test_header_menu_hidden_in_radio_mode() {
    let table = table(flat_rows(3), RowSelection::radio().selections(Selections::Builtin));
    assert!(table.selection_items().is_empty());
    let columns = table.render_columns();
    assert!(columns[0].as_selection().unwrap().header.is_none());
}

#[test]
fn test_radio_keeps_one_key_through_bulk_and_range_actions() {
    let (selection, changes) = capture(RowSelection::radio());
    let mut table = table(flat_rows(5), selection);

    table.click_row(&Key::from(2), Modifiers::NONE);
    table.select_all_on_page(true);
    table.click_select_all();
    table.select_range(&Key::from(1), &Key::from(4), true);
    table.invert_page_selection();
    table.select_all_data();
    assert_eq!(sorted(table.selected_keys()), keys(&[2]));

    table.clear_selection();
    assert!(table.selected_keys().is_empty());

    let changes = changes.lock().unwrap();
    assert_eq!(changes.len(), 2);
    assert!(changes.iter().all(|(keys, rows, _)| keys.len() <= 1 && rows.len() <= 1));
}

// ============================================================================
// Preserve Mode
// ============================================================================

#[test]
fn test_preserved_row_reported_after_rows_replaced() {
    let (selection, changes) = capture(RowSelection::new().preserve_selected_row_keys(true));
    let mut table = table(flat_rows(10), selection);

    table.click_row(&Key::from(9), Modifiers::NONE);
    table.set_rows(flat_rows(3));
    assert!(table.selected_keys().contains(&Key::from(9)));

    table.click_row(&Key::from(2), Modifiers::NONE);
    let changes = changes.lock().unwrap();
    let (keys, rows, _) = changes.last().unwrap();
    assert_eq!(keys, &self::keys(&[9, 2]));
    let names: Vec<String> = rows.iter().map(|r| r.get("name").unwrap().to_string()).collect();
    assert_eq!(names, vec!["row 9", "row 2"]);
}

#[test]
fn test_stale_keys_dropped_from_rows_without_preserve() {
    let (selection, changes) = capture(RowSelection::new());
    let mut table = table(flat_rows(10), selection);

    table.click_row(&Key::from(9), Modifiers::NONE);
    table.set_rows(flat_rows(3));
    table.click_row(&Key::from(1), Modifiers::NONE);

    let changes = changes.lock().unwrap();
    let (keys, rows, _) = changes.last().unwrap();
    assert_eq!(keys, &self::keys(&[9, 1]));
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_unknown_key_is_ignored() {
    let (selection, changes) = capture(RowSelection::new());
    let mut table = table(flat_rows(3), selection);
    table.select_row(&Key::from(77), true, Modifiers::NONE);
    assert!(table.selected_keys().is_empty());
    assert!(changes.lock().unwrap().is_empty());
}

// ============================================================================
// Callbacks
// ============================================================================

#[test]
fn test_on_select_receives_row_and_modifiers() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let seen = events.clone();
    let selection = RowSelection::new().on_select(move |row: &Record, selected, rows, modifiers| {
        let key = row.get("key").and_then(Value::as_i64).unwrap_or_default();
        seen.lock().unwrap().push((key, selected, rows.len(), modifiers.ctrl));
    });
    let mut table = table(flat_rows(3), selection);

    table.click_row(&Key::from(2), Modifiers::ctrl());
    table.click_row(&Key::from(2), Modifiers::NONE);
    assert_eq!(*events.lock().unwrap(), vec![(2, true, 1, true), (2, false, 0, false)]);
}
