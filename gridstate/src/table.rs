//! Table state: owns the engines of one table and runs the row pipeline.
//!
//! Rows flow sort, then filter, then paginate. Selection sees the filtered
//! rows and the current page. Columns flow the other way round through the
//! sorter, filter, selection and title transforms.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use log::{debug, trace};

use crate::column::{ColumnDescriptor, TitleContext, strip_selection_markers, title_transform, validate_columns};
use crate::error::Result;
use crate::events::{ChangeInfo, Modifiers, TableAction};
use crate::filter::{FilterEngine, FilterItem, apply_filters};
use crate::key::{Key, RowKeyFn, row_key_by_field};
use crate::locale::TableLocale;
use crate::pagination::{PaginationChangeFn, PaginationConfig, PaginationCoordinator, PaginationState};
use crate::record::TableRecord;
use crate::registry::KeyRegistry;
use crate::selection::{RowSelection, SelectionEngine, SelectionMenuItem};
use crate::sorter::{SorterConfig, SorterEngine, SorterInfo, sort_rows};
use crate::value::Value;

/// Default name of the field holding child rows.
pub const DEFAULT_CHILDREN_COLUMN: &str = "children";

/// Combined change notification, fired once per sort, filter or page change.
pub type TableChangeFn<R> = Arc<dyn Fn(&ChangeInfo<R>) + Send + Sync>;
pub type SortChangeFn = Arc<dyn Fn(&SorterInfo) + Send + Sync>;
pub type FilterChangeFn = Arc<dyn Fn(&BTreeMap<String, Option<Vec<Value>>>) + Send + Sync>;

/// Everything needed to set up a [`TableState`].
///
/// ```
/// use gridstate::{Column, PaginationConfig, Record, RowSelection, Sorter, TableConfig, TableState};
///
/// let rows = vec![
///     Record::new().set("key", 1).set("age", 30),
///     Record::new().set("key", 2).set("age", 25),
/// ];
/// let config = TableConfig::<Record>::new(vec![Column::new("Age").data_index("age").sorter(Sorter::by_field("age")).into()])
///     .row_selection(RowSelection::new())
///     .pagination(PaginationConfig::default().default_page_size(20));
///
/// let table = TableState::new(config, rows).unwrap();
/// assert_eq!(table.page_rows().len(), 2);
/// ```
#[derive(Clone)]
pub struct TableConfig<R> {
    pub columns: Vec<ColumnDescriptor<R>>,
    pub row_key: RowKeyFn<R>,
    pub children_column: String,
    pub row_selection: Option<RowSelection<R>>,
    pub pagination: PaginationConfig,
    pub sorter: SorterConfig,
    pub locale: TableLocale,
    pub on_change: Option<TableChangeFn<R>>,
    pub on_sort_change: Option<SortChangeFn>,
    pub on_filter_change: Option<FilterChangeFn>,
    pub on_pagination_change: Option<PaginationChangeFn>,
}

impl<R: TableRecord> TableConfig<R> {
    /// Config with the given columns, keys read from the `"key"` field.
    pub fn new(columns: Vec<ColumnDescriptor<R>>) -> Self {
        Self {
            columns,
            row_key: row_key_by_field("key"),
            children_column: DEFAULT_CHILDREN_COLUMN.to_string(),
            row_selection: None,
            pagination: PaginationConfig::default(),
            sorter: SorterConfig::default(),
            locale: TableLocale::default(),
            on_change: None,
            on_sort_change: None,
            on_filter_change: None,
            on_pagination_change: None,
        }
    }

    /// Read row keys from a named field.
    pub fn row_key_field(mut self, field: impl Into<String>) -> Self {
        self.row_key = row_key_by_field(field);
        self
    }
}

impl<R> TableConfig<R> {
    pub fn row_key<F>(mut self, f: F) -> Self
    where
        F: Fn(&R, usize) -> Option<Key> + Send + Sync + 'static,
    {
        self.row_key = Arc::new(f);
        self
    }

    pub fn children_column(mut self, column: impl Into<String>) -> Self {
        self.children_column = column.into();
        self
    }

    pub fn row_selection(mut self, selection: RowSelection<R>) -> Self {
        self.row_selection = Some(selection);
        self
    }

    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn sorter(mut self, sorter: SorterConfig) -> Self {
        self.sorter = sorter;
        self
    }

    pub fn locale(mut self, locale: TableLocale) -> Self {
        self.locale = locale;
        self
    }

    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&ChangeInfo<R>) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn on_sort_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&SorterInfo) + Send + Sync + 'static,
    {
        self.on_sort_change = Some(Arc::new(f));
        self
    }

    pub fn on_filter_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&BTreeMap<String, Option<Vec<Value>>>) + Send + Sync + 'static,
    {
        self.on_filter_change = Some(Arc::new(f));
        self
    }

    pub fn on_pagination_change<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_pagination_change = Some(Arc::new(f));
        self
    }
}

impl<R> fmt::Debug for TableConfig<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableConfig")
            .field("columns", &self.columns.len())
            .field("children_column", &self.children_column)
            .field("row_selection", &self.row_selection)
            .field("pagination", &self.pagination)
            .field("sorter", &self.sorter)
            .finish()
    }
}

/// State of one table.
///
/// Every interaction commits its state, resets pagination when the row set
/// changes shape, re-derives rows, and only then notifies the host.
pub struct TableState<R> {
    columns: Vec<ColumnDescriptor<R>>,
    row_key: RowKeyFn<R>,
    children_column: String,
    locale: TableLocale,

    rows: Vec<R>,
    registry: Arc<KeyRegistry<R>>,

    sorter: SorterEngine<R>,
    filter: FilterEngine<R>,
    pagination: PaginationCoordinator,
    selection: Option<SelectionEngine<R>>,

    /// Rows after sorting and filtering.
    data: Vec<R>,
    /// Rows of the current page.
    page: Vec<R>,

    on_change: Option<TableChangeFn<R>>,
    on_sort_change: Option<SortChangeFn>,
    on_filter_change: Option<FilterChangeFn>,
}

impl<R: TableRecord> TableState<R> {
    /// Set up a table.
    ///
    /// Fails when a column group holds a selection marker or a row has no key.
    pub fn new(config: TableConfig<R>, rows: Vec<R>) -> Result<Self> {
        validate_columns(&config.columns)?;
        let registry = KeyRegistry::build(&rows, &config.children_column, &config.row_key)?;

        let mut pagination = PaginationCoordinator::new(config.pagination);
        pagination.set_on_change(config.on_pagination_change);

        let selection = config
            .row_selection
            .map(|rs| SelectionEngine::new(rs, config.row_key.clone(), config.children_column.clone()));

        let mut table = Self {
            sorter: SorterEngine::new(&config.columns, config.sorter),
            filter: FilterEngine::new(&config.columns),
            columns: config.columns,
            row_key: config.row_key,
            children_column: config.children_column,
            locale: config.locale,
            rows,
            registry: Arc::new(registry),
            pagination,
            selection,
            data: Vec::new(),
            page: Vec::new(),
            on_change: config.on_change,
            on_sort_change: config.on_sort_change,
            on_filter_change: config.on_filter_change,
        };
        table.recompute();
        debug!("Table set up with {} rows", table.registry.len());
        Ok(table)
    }

    /// Replace the rows. Rows without a key are skipped with a warning.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.registry = Arc::new(KeyRegistry::build_lenient(&rows, &self.children_column, &self.row_key));
        self.rows = rows;
        self.recompute();
    }

    /// Replace the columns. Sort and filter state of surviving columns is kept.
    pub fn set_columns(&mut self, columns: Vec<ColumnDescriptor<R>>) -> Result<()> {
        validate_columns(&columns)?;
        self.sorter.set_columns(&columns);
        self.filter.set_columns(&columns);
        self.columns = columns;
        self.recompute();
        Ok(())
    }

    /// Replace the selection settings. `None` turns selection off and
    /// forgets the selected keys.
    pub fn set_row_selection(&mut self, selection: Option<RowSelection<R>>) {
        let Some(config) = selection else {
            if self.selection.take().is_some() {
                debug!("Row selection turned off");
            }
            return;
        };
        match self.selection.as_mut() {
            Some(engine) => engine.set_config(config),
            None => {
                let mut engine = SelectionEngine::new(config, self.row_key.clone(), self.children_column.clone());
                engine.clear_inner();
                self.selection = Some(engine);
            }
        }
        self.sync_selection();
    }

    /// Update the controlled selected keys.
    pub fn set_selected_row_keys(&mut self, keys: Option<Vec<Key>>) {
        if let Some(selection) = self.selection.as_mut() {
            selection.set_controlled_keys(keys);
        }
    }

    pub fn set_pagination(&mut self, config: PaginationConfig) {
        self.pagination.set_config(config);
        self.recompute();
    }

    pub fn set_locale(&mut self, locale: TableLocale) {
        self.locale = locale;
    }

    fn recompute(&mut self) {
        let sorted = sort_rows(&self.rows, &self.sorter.clauses(), &self.children_column);
        self.data = apply_filters(&sorted, &self.filter.clauses(), &self.children_column);
        self.page = self.pagination.page_rows(&self.data);
        self.sync_selection();
        trace!(
            "Rows derived: {} raw, {} after filters, {} on page",
            self.rows.len(),
            self.data.len(),
            self.page.len()
        );
    }

    fn sync_selection(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.sync(&self.data, &self.page, self.registry.clone());
        }
    }

    fn notify(&self, action: TableAction) {
        let Some(on_change) = &self.on_change else {
            return;
        };
        on_change(&ChangeInfo {
            pagination: self.pagination.merged(self.data.len()),
            filters: self.filter.filters_map(),
            sorter: self.sorter.sorter_info(),
            current_data_source: self.data.clone(),
            action,
        });
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn columns(&self) -> &[ColumnDescriptor<R>] {
        &self.columns
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Rows after sorting and filtering, before pagination.
    pub fn data(&self) -> &[R] {
        &self.data
    }

    /// Rows of the current page.
    pub fn page_rows(&self) -> &[R] {
        &self.page
    }

    /// Slice `rows` to the current page.
    pub fn get_page_rows(&self, rows: &[R]) -> Vec<R> {
        self.pagination.page_rows(rows)
    }

    pub fn pagination_state(&self) -> Option<PaginationState> {
        self.pagination.merged(self.data.len())
    }

    /// Selected keys, empty when selection is off.
    pub fn selected_keys(&self) -> IndexSet<Key> {
        self.selection
            .as_ref()
            .map(SelectionEngine::selected_keys)
            .unwrap_or_default()
    }

    pub fn half_selected_keys(&self) -> IndexSet<Key> {
        self.selection
            .as_ref()
            .map(SelectionEngine::half_selected_keys)
            .unwrap_or_default()
    }

    pub fn registry(&self) -> &KeyRegistry<R> {
        &self.registry
    }

    pub fn sorter(&self) -> &SorterEngine<R> {
        &self.sorter
    }

    pub fn filter(&self) -> &FilterEngine<R> {
        &self.filter
    }

    pub fn pagination(&self) -> &PaginationCoordinator {
        &self.pagination
    }

    pub fn selection(&self) -> Option<&SelectionEngine<R>> {
        self.selection.as_ref()
    }

    pub fn locale(&self) -> &TableLocale {
        &self.locale
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    /// Run `columns` through the sorter, filter, selection and title transforms.
    pub fn transform_columns(&self, columns: Vec<ColumnDescriptor<R>>) -> Vec<ColumnDescriptor<R>> {
        let columns = self.sorter.transform_columns(columns, &self.locale);
        let columns = self.filter.transform_columns(columns, &self.locale);
        let columns = match &self.selection {
            Some(selection) => selection.transform_columns(columns, &self.locale),
            None => strip_selection_markers(columns),
        };
        title_transform(columns, &self.title_context())
    }

    /// The configured columns, transformed.
    pub fn render_columns(&self) -> Vec<ColumnDescriptor<R>> {
        self.transform_columns(self.columns.clone())
    }

    fn title_context(&self) -> TitleContext {
        TitleContext {
            sort_columns: self.sorter.sort_columns(),
            filters: self.filter.active_filters(),
        }
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// Click a column's sort control. Returns `false` for unsortable columns.
    pub fn click_sort(&mut self, column_key: &str, modifiers: Modifiers) -> bool {
        if self.sorter.on_header_click(column_key, modifiers).is_none() {
            return false;
        }
        self.pagination.reset();
        self.recompute();

        let info = self.sorter.sorter_info();
        if let Some(on_sort_change) = &self.on_sort_change {
            on_sort_change(&info);
        }
        self.notify(TableAction::Sort);
        true
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    fn after_filter_commit(&mut self, changed: bool) -> bool {
        if !changed {
            return false;
        }
        self.pagination.reset();
        self.recompute();

        if let Some(on_filter_change) = &self.on_filter_change {
            on_filter_change(&self.filter.filters_map());
        }
        self.notify(TableAction::Filter);
        true
    }

    /// Commit filter values directly, bypassing the dropdown.
    pub fn commit_filter(&mut self, column_key: &str, values: Option<Vec<Value>>) -> bool {
        let changed = self.filter.commit(column_key, values);
        self.after_filter_commit(changed)
    }

    /// Open a column's filter dropdown. Returns whether confirming a
    /// previously open dropdown changed a filter.
    pub fn open_filter_dropdown(&mut self, column_key: &str) -> bool {
        let changed = self.filter.open_dropdown(column_key);
        self.after_filter_commit(changed)
    }

    pub fn toggle_filter_option(&mut self, value: impl Into<Value>) {
        self.filter.toggle_option(value.into());
    }

    pub fn set_filter_staged(&mut self, values: Vec<Value>) {
        self.filter.set_staged(values);
    }

    pub fn toggle_filter_check_all(&mut self) {
        self.filter.toggle_check_all();
    }

    /// Search the options of the open dropdown.
    pub fn search_filter(&mut self, query: &str) -> Vec<FilterItem> {
        self.filter.search(query)
    }

    pub fn confirm_filter(&mut self) -> bool {
        let changed = self.filter.confirm();
        self.after_filter_commit(changed)
    }

    pub fn reset_filter(&mut self) -> bool {
        let changed = self.filter.reset();
        self.after_filter_commit(changed)
    }

    pub fn close_filter_dropdown(&mut self) -> bool {
        let changed = self.filter.close_dropdown();
        self.after_filter_commit(changed)
    }

    // -------------------------------------------------------------------------
    // Pagination
    // -------------------------------------------------------------------------

    /// Navigate to a page. A zero `page_size` keeps the current size.
    pub fn change_page(&mut self, current: usize, page_size: usize) {
        if !self.pagination.is_enabled() {
            return;
        }
        self.pagination.change(current, page_size);
        self.recompute();
        self.notify(TableAction::Paginate);
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Set one row's selection.
    pub fn select_row(&mut self, key: &Key, selected: bool, modifiers: Modifiers) {
        if let Some(selection) = self.selection.as_mut() {
            selection.toggle_single(key, selected, modifiers);
        }
    }

    /// Click a row's checkbox or radio.
    pub fn click_row(&mut self, key: &Key, modifiers: Modifiers) {
        if let Some(selection) = self.selection.as_mut() {
            selection.on_cell_change(key, modifiers);
        }
    }

    pub fn select_range(&mut self, anchor: &Key, target: &Key, selected: bool) {
        if let Some(selection) = self.selection.as_mut() {
            selection.toggle_range(anchor, target, selected);
        }
    }

    pub fn select_all_on_page(&mut self, selected: bool) {
        if let Some(selection) = self.selection.as_mut() {
            selection.toggle_all_on_page(selected);
        }
    }

    /// Click the select-all checkbox.
    pub fn click_select_all(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.on_select_all_click();
        }
    }

    pub fn invert_page_selection(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.invert_on_page();
        }
    }

    pub fn select_all_data(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.select_all_data();
        }
    }

    pub fn clear_selection(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.clear_all_retaining_disabled();
        }
    }

    pub fn selection_items(&self) -> Vec<SelectionMenuItem> {
        self.selection
            .as_ref()
            .map(|s| s.selection_items(&self.locale))
            .unwrap_or_default()
    }

    /// Run a selection menu entry by key.
    pub fn run_selection_item(&mut self, key: &str) -> bool {
        self.selection
            .as_mut()
            .is_some_and(|s| s.run_selection_item(key))
    }
}

impl<R> fmt::Debug for TableState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableState")
            .field("rows", &self.rows.len())
            .field("data", &self.data.len())
            .field("page", &self.page.len())
            .field("pagination", &self.pagination)
            .field("selection", &self.selection.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::error::TableError;
    use crate::filter::ColumnFilter;
    use crate::record::Record;
    use crate::sorter::{SortOrder, Sorter};
    use std::sync::Mutex;

    fn rows(n: i64) -> Vec<Record> {
        (1..=n)
            .map(|i| {
                Record::new()
                    .set("key", i)
                    .set("age", 20 + (i % 3))
                    .set("status", if i % 2 == 0 { "active" } else { "idle" })
            })
            .collect()
    }

    fn columns() -> Vec<ColumnDescriptor<Record>> {
        vec![
            Column::new("Age").data_index("age").sorter(Sorter::by_field("age")).into(),
            Column::new("Status")
                .data_index("status")
                .filter(ColumnFilter::equals("status").items(vec![
                    FilterItem::new("Active", "active"),
                    FilterItem::new("Idle", "idle"),
                ]))
                .into(),
        ]
    }

    #[test]
    fn test_missing_row_key_fails_setup() {
        let rows = vec![Record::new().set("key", 1), Record::new().set("name", "no key")];
        let err = TableState::new(TableConfig::new(columns()), rows).unwrap_err();
        assert_eq!(err, TableError::MissingRowKey { index: 1, depth: 0 });
    }

    #[test]
    fn test_pipeline_sorts_filters_and_pages() {
        let config = TableConfig::new(columns()).pagination(PaginationConfig::default().default_page_size(3));
        let mut table = TableState::new(config, rows(10)).unwrap();
        assert_eq!(table.page_rows().len(), 3);

        assert!(table.commit_filter("status", Some(vec![Value::from("active")])));
        assert_eq!(table.data().len(), 5);

        assert!(table.click_sort("age", Modifiers::NONE));
        let ages: Vec<i64> = table
            .data()
            .iter()
            .filter_map(|r| r.get("age").and_then(|v| v.as_i64()))
            .collect();
        let mut sorted = ages.clone();
        sorted.sort();
        assert_eq!(ages, sorted);
        assert_eq!(table.sorter().order_of("age"), Some(SortOrder::Ascend));
    }

    #[test]
    fn test_change_fires_once_after_reset() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = events.clone();
        let pages = events.clone();
        let config = TableConfig::new(columns())
            .pagination(PaginationConfig::default().default_page_size(2))
            .on_pagination_change(move |current, _| pages.lock().unwrap().push(format!("page {}", current)))
            .on_change(move |info: &ChangeInfo<Record>| {
                let current = info.pagination.map(|p| p.current).unwrap_or_default();
                seen.lock().unwrap().push(format!("{:?} at {}", info.action, current));
            });
        let mut table = TableState::new(config, rows(10)).unwrap();

        table.change_page(3, 2);
        events.lock().unwrap().clear();

        table.commit_filter("status", Some(vec![Value::from("idle")]));
        assert_eq!(*events.lock().unwrap(), vec!["page 1".to_string(), "Filter at 1".to_string()]);

        events.lock().unwrap().clear();
        assert!(!table.commit_filter("status", Some(vec![Value::from("idle")])));
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_selection_marker_stripped_without_selection() {
        let mut cols = columns();
        cols.insert(1, ColumnDescriptor::SelectionMarker);
        let table = TableState::new(TableConfig::new(cols), rows(3)).unwrap();
        let out = table.render_columns();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.as_selection().is_none()));
    }

    #[test]
    fn test_selection_column_injected() {
        let config = TableConfig::new(columns()).row_selection(RowSelection::new());
        let table = TableState::new(config, rows(3)).unwrap();
        let out = table.render_columns();
        assert_eq!(out.len(), 3);
        assert!(out[0].as_selection().is_some());
        assert!(out[1].as_data().is_some_and(|c| c.sort_header.is_some()));
        assert!(out[2].as_data().is_some_and(|c| c.filter_header.is_some()));
    }

    #[test]
    fn test_turning_selection_off_forgets_keys() {
        let config = TableConfig::new(columns()).row_selection(RowSelection::new());
        let mut table = TableState::new(config, rows(3)).unwrap();
        table.select_row(&Key::from(2), true, Modifiers::NONE);
        assert_eq!(table.selected_keys().len(), 1);

        table.set_row_selection(None);
        assert!(table.selected_keys().is_empty());
        table.set_row_selection(Some(RowSelection::new().default_selected_row_keys(vec![Key::from(1)])));
        assert!(table.selected_keys().is_empty());
    }
}
