//! End-to-end walks through the table engine.

use std::sync::{Arc, Mutex};

use gridstate::prelude::*;
use gridstate::{CheckedState, KeyEntities, conduct_check, row_key_by_field};
use simplelog::{Config, LevelFilter, TestLogger};

fn init_logger() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}

fn ids(rows: &[Record]) -> Vec<i64> {
    rows.iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect()
}

fn sorted(keys: impl IntoIterator<Item = Key>) -> Vec<Key> {
    let mut keys: Vec<Key> = keys.into_iter().collect();
    keys.sort();
    keys
}

fn numbered(n: i64) -> Vec<Record> {
    (0..n).map(|i| Record::new().set("key", i).set("name", format!("row {}", i))).collect()
}

// ============================================================================
// Tree check propagation
// ============================================================================

#[test]
fn test_checking_both_children_checks_parent() {
    init_logger();
    let rows = Record::list_from_json(
        &serde_json::json!([{"key": "A", "children": [{"key": "A1"}, {"key": "A2"}]}]),
        "children",
    );
    let entities = KeyEntities::from_rows(&rows, "children", &row_key_by_field("key"));
    let never = |_: &Key| false;

    let first = conduct_check(&[Key::from("A1")], &CheckedState::Checked, &entities, never);
    assert_eq!(first.checked_keys, vec![Key::from("A1")]);
    assert_eq!(first.half_checked_keys, vec![Key::from("A")]);

    let second = conduct_check(&[Key::from("A1"), Key::from("A2")], &CheckedState::Checked, &entities, never);
    assert_eq!(sorted(second.checked_keys), sorted(vec![Key::from("A1"), Key::from("A2"), Key::from("A")]));
    assert!(second.half_checked_keys.is_empty());

    // same walk through the table
    let mut table = TableState::new(
        TableConfig::new(vec![Column::new("Key").data_index("key").into()])
            .row_selection(RowSelection::new().check_strictly(false)),
        rows,
    )
    .unwrap();
    table.click_row(&Key::from("A1"), Modifiers::NONE);
    table.click_row(&Key::from("A2"), Modifiers::NONE);
    assert_eq!(table.selected_keys().len(), 3);
    assert!(table.half_selected_keys().is_empty());
}

// ============================================================================
// Stable sorting
// ============================================================================

#[test]
fn test_equal_ages_keep_input_order() {
    init_logger();
    let rows = Record::list_from_json(
        &serde_json::json!([
            {"id": 1, "age": 30},
            {"id": 2, "age": 25},
            {"id": 3, "age": 25}
        ]),
        "children",
    );
    let columns: Vec<ColumnDescriptor<Record>> = vec![Column::new("Age").data_index("age").sorter(Sorter::by_field("age")).into()];
    let mut table = TableState::new(TableConfig::new(columns).row_key_field("id"), rows).unwrap();

    table.click_sort("age", Modifiers::NONE);
    assert_eq!(ids(table.data()), vec![2, 3, 1]);
}

// ============================================================================
// Radio selection
// ============================================================================

#[test]
fn test_radio_keeps_only_the_last_pick() {
    init_logger();
    let mut table = TableState::new(
        TableConfig::new(vec![Column::new("Name").data_index("name").into()]).row_selection(RowSelection::radio()),
        numbered(10),
    )
    .unwrap();

    table.click_row(&Key::from(5), Modifiers::NONE);
    table.click_row(&Key::from(7), Modifiers::NONE);
    assert_eq!(sorted(table.selected_keys()), vec![Key::from(7)]);

    let columns = table.render_columns();
    let selection = columns[0].as_selection().unwrap();
    let cells: Vec<bool> = table
        .page_rows()
        .iter()
        .enumerate()
        .map(|(i, row)| selection.cell(row, i).checked)
        .collect();
    assert_eq!(cells.iter().filter(|c| **c).count(), 1);
    assert!(cells[7]);
}

// ============================================================================
// Filter with page reset
// ============================================================================

#[test]
fn test_status_filter_returns_matches_and_resets_page() {
    init_logger();
    let rows: Vec<Record> = (1..=10)
        .map(|i: i64| {
            Record::new()
                .set("key", i)
                .set("status", if [2, 4, 7, 9].contains(&i) { "active" } else { "inactive" })
        })
        .collect();
    let pages = Arc::new(Mutex::new(Vec::new()));
    let seen = pages.clone();
    let columns: Vec<ColumnDescriptor<Record>> = vec![
        Column::new("Status")
            .data_index("status")
            .filter(ColumnFilter::equals("status").items(vec![
                FilterItem::new("Active", "active"),
                FilterItem::new("Inactive", "inactive"),
            ]))
            .into(),
    ];
    let config = TableConfig::new(columns)
        .pagination(PaginationConfig::default().default_page_size(3))
        .on_pagination_change(move |current, size| seen.lock().unwrap().push((current, size)));
    let mut table = TableState::new(config, rows).unwrap();

    table.change_page(3, 3);
    assert_eq!(table.pagination_state().unwrap().current, 3);
    pages.lock().unwrap().clear();

    table.commit_filter("status", Some(vec![Value::from("active")]));
    assert_eq!(table.data().len(), 4);
    assert_eq!(table.pagination_state().unwrap().current, 1);
    assert_eq!(*pages.lock().unwrap(), vec![(1, 3)]);
}

// ============================================================================
// Preserved selection across filtering
// ============================================================================

#[test]
fn test_filtered_out_selection_survives() {
    init_logger();
    let changes: Arc<Mutex<Vec<(Vec<Key>, Vec<Record>)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = changes.clone();
    let rows: Vec<Record> = (1..=10)
        .map(|i: i64| Record::new().set("key", i).set("group", if i == 9 { "hidden" } else { "shown" }))
        .collect();
    let columns: Vec<ColumnDescriptor<Record>> = vec![
        Column::new("Group")
            .data_index("group")
            .filter(ColumnFilter::equals("group").items(vec![
                FilterItem::new("Shown", "shown"),
                FilterItem::new("Hidden", "hidden"),
            ]))
            .into(),
    ];
    let selection = RowSelection::new()
        .preserve_selected_row_keys(true)
        .on_change(move |keys, rows, _| seen.lock().unwrap().push((keys.to_vec(), rows.to_vec())));
    let mut table = TableState::new(TableConfig::new(columns).row_selection(selection), rows).unwrap();

    table.click_row(&Key::from(9), Modifiers::NONE);
    table.commit_filter("group", Some(vec![Value::from("shown")]));
    assert!(table.page_rows().iter().all(|r| r.get("key") != Some(&Value::from(9))));
    assert!(table.selected_keys().contains(&Key::from(9)));

    table.click_row(&Key::from(3), Modifiers::NONE);
    let changes = changes.lock().unwrap();
    let (keys, rows) = changes.last().unwrap();
    assert_eq!(keys, &vec![Key::from(9), Key::from(3)]);
    assert!(rows.iter().any(|r| r.get("key") == Some(&Value::from(9))));
}

// ============================================================================
// Shift-click ranges
// ============================================================================

#[test]
fn test_shift_click_checks_span_and_keeps_others() {
    init_logger();
    let changes = Arc::new(Mutex::new(Vec::new()));
    let seen = changes.clone();
    let selection = RowSelection::new()
        .default_selected_row_keys(vec![Key::from(9)])
        .on_change(move |_, _, info| seen.lock().unwrap().push(info.method));
    let mut table = TableState::new(
        TableConfig::new(vec![Column::new("Name").data_index("name").into()]).row_selection(selection),
        numbered(10),
    )
    .unwrap();

    table.click_row(&Key::from(2), Modifiers::NONE);
    table.click_row(&Key::from(6), Modifiers::shift());

    assert_eq!(
        sorted(table.selected_keys()),
        vec![2i64, 3, 4, 5, 6, 9].into_iter().map(Key::from).collect::<Vec<Key>>()
    );
    assert_eq!(
        *changes.lock().unwrap(),
        vec![RowSelectMethod::Single, RowSelectMethod::Multiple]
    );
}

#[test]
fn test_shift_click_in_tree_mode_toggles_one_row() {
    init_logger();
    let mut table = TableState::new(
        TableConfig::new(vec![Column::new("Name").data_index("name").into()])
            .row_selection(RowSelection::new().check_strictly(false)),
        numbered(8),
    )
    .unwrap();

    table.click_row(&Key::from(1), Modifiers::NONE);
    table.click_row(&Key::from(5), Modifiers::shift());
    assert_eq!(sorted(table.selected_keys()), vec![Key::from(1), Key::from(5)]);
}
