//! Filter engine: committed filter state per column and the dropdown
//! staging protocol.

use std::collections::BTreeMap;

use log::{debug, trace};

use super::{
    ColumnFilter, FilterClause, FilterItem, FilterSearch, flatten_item_values, resolve_value, search_options,
};
use crate::column::{ColumnDescriptor, for_each_column, map_columns};
use crate::locale::TableLocale;
use crate::value::Value;

/// Committed filter state of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub column_key: String,
    /// Selected values; `None` when the column is unfiltered.
    pub filtered_keys: Option<Vec<Value>>,
    /// Forced indicator state, from the column's `filtered` flag.
    pub forced: Option<bool>,
}

/// The open filter dropdown and its staged, uncommitted selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DropdownState {
    pub column_key: String,
    pub staged: Vec<Value>,
    pub query: String,
}

/// Filter affordance attached to a filterable column header.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterHeader {
    /// Whether the filter indicator is lit.
    pub filtered: bool,
    pub open: bool,
    /// Staged values while open, committed values otherwise.
    pub selected: Vec<Value>,
    /// Options visible under the current search query.
    pub options: Vec<FilterItem>,
    pub multiple: bool,
    /// Every option is staged.
    pub all_checked: bool,
    pub title: String,
    pub confirm_text: String,
    pub reset_text: String,
    pub empty_text: String,
    /// Placeholder of the search box, `None` when search is off.
    pub search_placeholder: Option<String>,
}

struct FilterableColumn<R> {
    key: String,
    filter: ColumnFilter<R>,
}

/// Owns the filter state of one table.
pub struct FilterEngine<R> {
    columns: Vec<FilterableColumn<R>>,
    states: Vec<FilterState>,
    dropdown: Option<DropdownState>,
}

impl<R> FilterEngine<R> {
    /// Collect filterable columns, seeding state from `default_filtered_value`.
    pub fn new(columns: &[ColumnDescriptor<R>]) -> Self {
        let mut engine = Self {
            columns: Vec::new(),
            states: Vec::new(),
            dropdown: None,
        };
        engine.collect(columns);
        engine.states = engine
            .columns
            .iter()
            .map(|c| FilterState {
                column_key: c.key.clone(),
                filtered_keys: c.filter.default_filtered_value.clone().filter(|v| !v.is_empty()),
                forced: c.filter.filtered,
            })
            .collect();
        engine
    }

    /// Pick up a changed column list.
    ///
    /// Committed values of columns that are still filterable survive; new
    /// columns start unfiltered.
    pub fn set_columns(&mut self, columns: &[ColumnDescriptor<R>]) {
        self.collect(columns);
        let previous = std::mem::take(&mut self.states);
        self.states = self
            .columns
            .iter()
            .map(|c| {
                let filtered_keys = previous
                    .iter()
                    .find(|s| s.column_key == c.key)
                    .and_then(|s| s.filtered_keys.clone());
                FilterState {
                    column_key: c.key.clone(),
                    filtered_keys,
                    forced: c.filter.filtered,
                }
            })
            .collect();

        let stale = self
            .dropdown
            .as_ref()
            .is_some_and(|d| self.column(&d.column_key).is_none());
        if stale {
            self.dropdown = None;
        }
    }

    fn collect(&mut self, columns: &[ColumnDescriptor<R>]) {
        let mut filterable = Vec::new();
        for_each_column(columns, &mut |column, key| {
            if let Some(filter) = &column.filter {
                filterable.push(FilterableColumn {
                    key,
                    filter: filter.clone(),
                });
            }
        });
        self.columns = filterable;
    }

    fn column(&self, key: &str) -> Option<&ColumnFilter<R>> {
        self.columns.iter().find(|c| c.key == key).map(|c| &c.filter)
    }

    /// Effective filter states. A controlled column reports its controlled
    /// value; the others report committed internal state.
    pub fn filter_states(&self) -> Vec<FilterState> {
        self.columns
            .iter()
            .map(|c| {
                let filtered_keys = match &c.filter.filtered_value {
                    Some(controlled) => controlled.clone(),
                    None => self
                        .states
                        .iter()
                        .find(|s| s.column_key == c.key)
                        .and_then(|s| s.filtered_keys.clone()),
                };
                FilterState {
                    column_key: c.key.clone(),
                    filtered_keys,
                    forced: c.filter.filtered,
                }
            })
            .collect()
    }

    /// Effective selected values of a column.
    pub fn filtered_keys(&self, column_key: &str) -> Option<Vec<Value>> {
        self.filter_states()
            .into_iter()
            .find(|s| s.column_key == column_key)
            .and_then(|s| s.filtered_keys)
    }

    /// Whether the column's filter indicator is lit.
    pub fn is_filtered(&self, column_key: &str) -> bool {
        self.filter_states()
            .into_iter()
            .find(|s| s.column_key == column_key)
            .map(|s| {
                s.forced
                    .unwrap_or_else(|| s.filtered_keys.is_some_and(|v| !v.is_empty()))
            })
            .unwrap_or(false)
    }

    /// Active clauses for [`apply_filters`](super::apply_filters).
    pub fn clauses(&self) -> Vec<FilterClause<R>> {
        let clauses: Vec<FilterClause<R>> = self
            .filter_states()
            .into_iter()
            .filter_map(|state| {
                let values = state.filtered_keys.filter(|v| !v.is_empty())?;
                let filter = self.column(&state.column_key)?;
                let predicate = filter.on_filter.clone()?;
                Some(FilterClause {
                    values: values.iter().map(|v| resolve_value(v, &filter.items)).collect(),
                    column_key: state.column_key,
                    predicate,
                })
            })
            .collect();
        trace!("{} filter clause(s) active", clauses.len());
        clauses
    }

    /// Committed values of every filterable column, for change callbacks.
    pub fn filters_map(&self) -> BTreeMap<String, Option<Vec<Value>>> {
        self.filter_states()
            .into_iter()
            .map(|s| (s.column_key, s.filtered_keys))
            .collect()
    }

    /// Active filters only, for dynamic titles.
    pub fn active_filters(&self) -> BTreeMap<String, Vec<Value>> {
        self.filter_states()
            .into_iter()
            .filter_map(|s| s.filtered_keys.filter(|v| !v.is_empty()).map(|v| (s.column_key, v)))
            .collect()
    }

    /// Commit values for a column. An empty list clears the filter.
    ///
    /// Returns `false` when the column is unknown or the value is
    /// unchanged; nothing downstream should fire then.
    pub fn commit(&mut self, column_key: &str, values: Option<Vec<Value>>) -> bool {
        if self.column(column_key).is_none() {
            return false;
        }
        let values = values.filter(|v| !v.is_empty());
        if self.filtered_keys(column_key) == values {
            trace!("Filter on '{}' unchanged", column_key);
            return false;
        }

        debug!("Filter on '{}' committed: {:?}", column_key, values);
        match self.states.iter_mut().find(|s| s.column_key == column_key) {
            Some(state) => state.filtered_keys = values,
            None => self.states.push(FilterState {
                column_key: column_key.to_string(),
                filtered_keys: values,
                forced: None,
            }),
        }
        true
    }

    // -------------------------------------------------------------------------
    // Dropdown protocol
    // -------------------------------------------------------------------------

    /// Open a column's dropdown, staging its committed values.
    ///
    /// An already open dropdown on another column is confirmed first;
    /// returns whether that confirmation changed a filter.
    pub fn open_dropdown(&mut self, column_key: &str) -> bool {
        if self.column(column_key).is_none() {
            return false;
        }
        let other_open = self
            .dropdown
            .as_ref()
            .is_some_and(|d| d.column_key != column_key);
        let changed = other_open && self.confirm();
        self.dropdown = Some(DropdownState {
            column_key: column_key.to_string(),
            staged: self.filtered_keys(column_key).unwrap_or_default(),
            query: String::new(),
        });
        changed
    }

    pub fn dropdown(&self) -> Option<&DropdownState> {
        self.dropdown.as_ref()
    }

    /// Toggle one option in the staged selection.
    ///
    /// Single-choice columns replace the selection instead.
    pub fn toggle_option(&mut self, value: Value) {
        let Some(dropdown) = &self.dropdown else {
            return;
        };
        let multiple = self.column(&dropdown.column_key).is_some_and(|f| f.multiple);
        let Some(dropdown) = self.dropdown.as_mut() else {
            return;
        };

        if !multiple {
            dropdown.staged = vec![value];
        } else if let Some(pos) = dropdown.staged.iter().position(|v| *v == value) {
            dropdown.staged.remove(pos);
        } else {
            dropdown.staged.push(value);
        }
    }

    /// Replace the staged selection.
    pub fn set_staged(&mut self, values: Vec<Value>) {
        if let Some(dropdown) = self.dropdown.as_mut() {
            dropdown.staged = values;
        }
    }

    /// Stage every option, or none when every option is already staged.
    pub fn toggle_check_all(&mut self) {
        let Some(dropdown) = &self.dropdown else {
            return;
        };
        let Some(filter) = self.column(&dropdown.column_key) else {
            return;
        };
        if !filter.multiple {
            return;
        }
        let all = flatten_item_values(&filter.items);
        let every = all.iter().all(|v| dropdown.staged.contains(v));
        self.set_staged(if every { Vec::new() } else { all });
    }

    /// Set the search query. Returns the options now visible.
    pub fn search(&mut self, query: &str) -> Vec<FilterItem> {
        let Some(dropdown) = self.dropdown.as_mut() else {
            return Vec::new();
        };
        dropdown.query = query.to_string();
        self.visible_options()
    }

    /// Options of the open dropdown under its current query.
    pub fn visible_options(&self) -> Vec<FilterItem> {
        let Some(dropdown) = &self.dropdown else {
            return Vec::new();
        };
        match self.column(&dropdown.column_key) {
            Some(filter) => search_options(&dropdown.query, &filter.items, &filter.search),
            None => Vec::new(),
        }
    }

    /// Commit the staged selection and close. Returns whether the filter changed.
    pub fn confirm(&mut self) -> bool {
        let Some(dropdown) = self.dropdown.take() else {
            return false;
        };
        self.commit(&dropdown.column_key, Some(dropdown.staged))
    }

    /// Clear (or restore the default of) the open column and close.
    /// Returns whether the filter changed.
    pub fn reset(&mut self) -> bool {
        let Some(dropdown) = self.dropdown.take() else {
            return false;
        };
        let values = self
            .column(&dropdown.column_key)
            .filter(|f| f.reset_to_default)
            .and_then(|f| f.default_filtered_value.clone());
        self.commit(&dropdown.column_key, values)
    }

    /// Close the dropdown. Staged values are confirmed.
    pub fn close_dropdown(&mut self) -> bool {
        self.confirm()
    }

    /// Annotate filterable columns with their [`FilterHeader`].
    pub fn transform_columns(&self, columns: Vec<ColumnDescriptor<R>>, locale: &TableLocale) -> Vec<ColumnDescriptor<R>> {
        map_columns(columns, &mut |mut column, key| {
            let Some(filter) = self.column(key) else {
                return column;
            };
            let open = self.dropdown.as_ref().filter(|d| d.column_key == key);
            let selected = match open {
                Some(dropdown) => dropdown.staged.clone(),
                None => self.filtered_keys(key).unwrap_or_default(),
            };
            let options = match open {
                Some(dropdown) => search_options(&dropdown.query, &filter.items, &filter.search),
                None => filter.items.clone(),
            };
            let all = flatten_item_values(&filter.items);
            let all_checked = !all.is_empty() && all.iter().all(|v| selected.contains(v));

            column.filter_header = Some(FilterHeader {
                filtered: self.is_filtered(key),
                open: open.is_some(),
                selected,
                options,
                multiple: filter.multiple,
                all_checked,
                title: locale.filter_title.clone(),
                confirm_text: locale.filter_confirm.clone(),
                reset_text: locale.filter_reset.clone(),
                empty_text: locale.filter_empty_text.clone(),
                search_placeholder: match filter.search {
                    FilterSearch::Disabled => None,
                    _ => Some(locale.filter_search_placeholder.clone()),
                },
            });
            column
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::record::Record;

    fn status_filter() -> ColumnFilter<Record> {
        ColumnFilter::equals("status").items(vec![
            FilterItem::new("Active", "active"),
            FilterItem::new("Idle", "idle"),
        ])
    }

    fn columns(filter: ColumnFilter<Record>) -> Vec<ColumnDescriptor<Record>> {
        vec![
            Column::new("Status").data_index("status").filter(filter).into(),
            Column::new("Name").data_index("name").into(),
        ]
    }

    #[test]
    fn test_commit_unchanged_is_noop() {
        let mut engine = FilterEngine::new(&columns(status_filter()));
        assert!(engine.commit("status", Some(vec!["active".into()])));
        assert!(!engine.commit("status", Some(vec!["active".into()])));
        assert!(!engine.commit("name", Some(vec!["x".into()])));
    }

    #[test]
    fn test_empty_commit_clears() {
        let mut engine = FilterEngine::new(&columns(status_filter()));
        engine.commit("status", Some(vec!["active".into()]));
        assert!(engine.commit("status", Some(vec![])));
        assert_eq!(engine.filtered_keys("status"), None);
        assert!(engine.clauses().is_empty());
    }

    #[test]
    fn test_staged_values_commit_on_confirm() {
        let mut engine = FilterEngine::new(&columns(status_filter()));
        engine.open_dropdown("status");
        engine.toggle_option("active".into());
        engine.toggle_option("idle".into());
        engine.toggle_option("idle".into());
        assert_eq!(engine.filtered_keys("status"), None);

        assert!(engine.confirm());
        assert_eq!(engine.filtered_keys("status"), Some(vec![Value::from("active")]));
        assert!(engine.dropdown().is_none());
    }

    #[test]
    fn test_close_auto_confirms() {
        let mut engine = FilterEngine::new(&columns(status_filter()));
        engine.open_dropdown("status");
        engine.set_staged(vec!["idle".into()]);
        assert!(engine.close_dropdown());
        assert!(engine.is_filtered("status"));
    }

    #[test]
    fn test_single_choice_replaces() {
        let mut engine = FilterEngine::new(&columns(status_filter().single()));
        engine.open_dropdown("status");
        engine.toggle_option("active".into());
        engine.toggle_option("idle".into());
        assert_eq!(engine.dropdown().unwrap().staged, vec![Value::from("idle")]);
    }

    #[test]
    fn test_reset_clears_or_restores_default() {
        let mut engine = FilterEngine::new(&columns(status_filter()));
        engine.commit("status", Some(vec!["idle".into()]));
        engine.open_dropdown("status");
        assert!(engine.reset());
        assert_eq!(engine.filtered_keys("status"), None);

        let filter = status_filter()
            .default_filtered_value(vec!["active".into()])
            .reset_to_default();
        let mut engine = FilterEngine::new(&columns(filter));
        assert_eq!(engine.filtered_keys("status"), Some(vec![Value::from("active")]));
        engine.commit("status", Some(vec!["idle".into()]));
        engine.open_dropdown("status");
        engine.reset();
        assert_eq!(engine.filtered_keys("status"), Some(vec![Value::from("active")]));
    }

    #[test]
    fn test_controlled_value_wins() {
        let filter = status_filter().filtered_value(Some(vec!["idle".into()]));
        let mut engine = FilterEngine::new(&columns(filter));
        engine.commit("status", Some(vec!["active".into()]));
        assert_eq!(engine.filtered_keys("status"), Some(vec![Value::from("idle")]));
    }

    #[test]
    fn test_check_all_toggles() {
        let mut engine = FilterEngine::new(&columns(status_filter()));
        engine.open_dropdown("status");
        engine.toggle_check_all();
        assert_eq!(engine.dropdown().unwrap().staged.len(), 2);
        engine.toggle_check_all();
        assert!(engine.dropdown().unwrap().staged.is_empty());
    }

    #[test]
    fn test_filters_map_lists_every_filterable_column() {
        let mut engine = FilterEngine::new(&columns(status_filter()));
        engine.commit("status", Some(vec!["idle".into()]));
        let map = engine.filters_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["status"], Some(vec![Value::from("idle")]));
    }

    #[test]
    fn test_transform_reports_open_and_staged() {
        let mut engine = FilterEngine::new(&columns(status_filter().search(FilterSearch::Fuzzy)));
        engine.open_dropdown("status");
        engine.toggle_option("idle".into());
        engine.search("act");

        let out = engine.transform_columns(columns(status_filter()), &TableLocale::default());
        let header = out[0].as_data().unwrap().filter_header.clone().unwrap();
        assert!(header.open);
        assert!(!header.filtered);
        assert_eq!(header.selected, vec![Value::from("idle")]);
        assert_eq!(header.options.len(), 1);
        assert_eq!(header.search_placeholder.as_deref(), Some("Search in filters"));
        assert!(out[1].as_data().unwrap().filter_header.is_none());
    }

    #[test]
    fn test_engine_works_for_records_without_clone() {
        struct Opaque(i64);

        let filter = ColumnFilter::new(|value: &Value, row: &Opaque| value.as_i64() == Some(row.0))
            .items(vec![FilterItem::new("One", 1), FilterItem::new("Two", 2)]);
        let cols: Vec<ColumnDescriptor<Opaque>> = vec![Column::new("Id").key("id").filter(filter).into()];
        let mut engine = FilterEngine::new(&cols);
        engine.set_columns(&cols);

        assert!(engine.commit("id", Some(vec![Value::from(2)])));
        let clauses = engine.clauses();
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].clone().matches(&Opaque(2)));
        assert!(!clauses[0].matches(&Opaque(1)));
    }
}
