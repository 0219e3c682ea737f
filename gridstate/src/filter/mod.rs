//! Column filtering: filter options, the row predicate chain, and the
//! staged dropdown protocol.

mod search;
mod state;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::record::TableRecord;
use crate::value::Value;

pub use search::{OptionMatch, fuzzy_matches, search_options};
pub use state::{DropdownState, FilterEngine, FilterHeader, FilterState};

/// One option of a column's filter menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterItem {
    pub text: String,
    pub value: Value,
    /// Nested options shown as a submenu or tree.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilterItem>,
}

impl FilterItem {
    pub fn new(text: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            children: Vec::new(),
        }
    }

    pub fn children(mut self, children: Vec<FilterItem>) -> Self {
        self.children = children;
        self
    }
}

/// Every option value in a menu, parents before children.
pub fn flatten_item_values(items: &[FilterItem]) -> Vec<Value> {
    let mut values = Vec::new();
    for item in items {
        values.push(item.value.clone());
        values.extend(flatten_item_values(&item.children));
    }
    values
}

/// Map a selected value back to the declared option value it stands for.
///
/// Selected values may arrive as strings (from a URL, a form, a JSON
/// state file); they match an option when their text forms are equal.
pub fn resolve_value(selected: &Value, items: &[FilterItem]) -> Value {
    let text = selected.to_string();
    flatten_item_values(items)
        .into_iter()
        .find(|v| v.to_string() == text)
        .unwrap_or_else(|| selected.clone())
}

/// Row predicate: `(selected value, row) -> keep`.
pub type FilterFn<R> = Arc<dyn Fn(&Value, &R) -> bool + Send + Sync>;

/// Option search predicate: `(query, option) -> visible`.
pub type SearchFn = Arc<dyn Fn(&str, &FilterItem) -> bool + Send + Sync>;

/// How the dropdown's search box matches options.
#[derive(Clone, Default)]
pub enum FilterSearch {
    /// No search box.
    #[default]
    Disabled,
    /// Fuzzy match against option labels.
    Fuzzy,
    Custom(SearchFn),
}

impl FilterSearch {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, FilterSearch::Disabled)
    }
}

impl fmt::Debug for FilterSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSearch::Disabled => f.write_str("Disabled"),
            FilterSearch::Fuzzy => f.write_str("Fuzzy"),
            FilterSearch::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Filtering capability of a column.
///
/// # Example
///
/// ```
/// use gridstate::{ColumnFilter, FilterItem, Record};
///
/// let status = ColumnFilter::<Record>::equals("status")
///     .items(vec![
///         FilterItem::new("Active", "active"),
///         FilterItem::new("Archived", "archived"),
///     ]);
/// assert!(status.multiple);
/// ```
pub struct ColumnFilter<R> {
    pub items: Vec<FilterItem>,
    /// Row predicate. Without one the column only tracks filter state
    /// (for data filtered elsewhere).
    pub on_filter: Option<FilterFn<R>>,
    /// Allow several options at once.
    pub multiple: bool,
    /// Controlled selection. `Some(None)` pins the column unfiltered.
    pub filtered_value: Option<Option<Vec<Value>>>,
    /// Initial selection when uncontrolled.
    pub default_filtered_value: Option<Vec<Value>>,
    /// Force the filtered indicator on or off.
    pub filtered: Option<bool>,
    /// Reset restores `default_filtered_value` instead of clearing.
    pub reset_to_default: bool,
    pub search: FilterSearch,
}

impl<R> Clone for ColumnFilter<R> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            on_filter: self.on_filter.clone(),
            multiple: self.multiple,
            filtered_value: self.filtered_value.clone(),
            default_filtered_value: self.default_filtered_value.clone(),
            filtered: self.filtered,
            reset_to_default: self.reset_to_default,
            search: self.search.clone(),
        }
    }
}

impl<R> Default for ColumnFilter<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            on_filter: None,
            multiple: true,
            filtered_value: None,
            default_filtered_value: None,
            filtered: None,
            reset_to_default: false,
            search: FilterSearch::Disabled,
        }
    }
}

impl<R> ColumnFilter<R> {
    /// Filter with a custom predicate.
    pub fn new<F>(on_filter: F) -> Self
    where
        F: Fn(&Value, &R) -> bool + Send + Sync + 'static,
    {
        Self {
            on_filter: Some(Arc::new(on_filter)),
            ..Default::default()
        }
    }

    /// Track filter state only; rows are filtered by whoever supplies them.
    pub fn server() -> Self {
        Self::default()
    }

    pub fn items(mut self, items: Vec<FilterItem>) -> Self {
        self.items = items;
        self
    }

    /// Allow only one option at a time.
    pub fn single(mut self) -> Self {
        self.multiple = false;
        self
    }

    /// Control the selection from outside.
    pub fn filtered_value(mut self, values: Option<Vec<Value>>) -> Self {
        self.filtered_value = Some(values);
        self
    }

    pub fn default_filtered_value(mut self, values: Vec<Value>) -> Self {
        self.default_filtered_value = Some(values);
        self
    }

    pub fn filtered(mut self, filtered: bool) -> Self {
        self.filtered = Some(filtered);
        self
    }

    pub fn reset_to_default(mut self) -> Self {
        self.reset_to_default = true;
        self
    }

    pub fn search(mut self, search: FilterSearch) -> Self {
        self.search = search;
        self
    }
}

impl<R: TableRecord> ColumnFilter<R> {
    /// Keep rows whose `field` equals the selected value.
    pub fn equals(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(move |value: &Value, row: &R| row.field(&field) == Some(value))
    }
}

impl<R> fmt::Debug for ColumnFilter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFilter")
            .field("items", &self.items)
            .field("on_filter", &self.on_filter.is_some())
            .field("multiple", &self.multiple)
            .field("filtered_value", &self.filtered_value)
            .field("default_filtered_value", &self.default_filtered_value)
            .field("search", &self.search)
            .finish()
    }
}

/// An active column filter, ready to apply.
pub struct FilterClause<R> {
    pub column_key: String,
    /// Selected values, already resolved against the column's options.
    pub values: Vec<Value>,
    pub predicate: FilterFn<R>,
}

impl<R> Clone for FilterClause<R> {
    fn clone(&self) -> Self {
        Self {
            column_key: self.column_key.clone(),
            values: self.values.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<R> FilterClause<R> {
    /// A row passes when the predicate holds for any selected value.
    pub fn matches(&self, row: &R) -> bool {
        self.values.iter().any(|v| (self.predicate)(v, row))
    }
}

impl<R> fmt::Debug for FilterClause<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterClause")
            .field("column_key", &self.column_key)
            .field("values", &self.values)
            .finish()
    }
}

/// Keep the rows that pass every clause.
///
/// Values within one clause are OR-ed; clauses are AND-ed. In tree data a
/// row stays when it passes itself or when any descendant does, and its
/// children are filtered the same way.
pub fn apply_filters<R: TableRecord>(rows: &[R], clauses: &[FilterClause<R>], children_column: &str) -> Vec<R> {
    if clauses.is_empty() {
        return rows.to_vec();
    }

    rows.iter()
        .filter_map(|row| {
            let matched = clauses.iter().all(|c| c.matches(row));
            match row.children(children_column) {
                Some(children) => {
                    let kept = apply_filters(children, clauses, children_column);
                    (matched || !kept.is_empty()).then(|| row.with_children(children_column, kept))
                }
                None => matched.then(|| row.clone()),
            }
        })
        .collect()
}
