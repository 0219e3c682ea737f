//! Column descriptors.
//!
//! A column list is a tree of [`ColumnDescriptor`]s: data columns, groups
//! with nested children, the expand column, and the selection marker that
//! the selection transform swaps for a concrete [`SelectionColumn`].
//!
//! Every transform in this crate is a pure `Vec<ColumnDescriptor<R>> ->
//! Vec<ColumnDescriptor<R>>` function; transforms annotate clones and
//! never mutate the caller's list.

mod title;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use crate::filter::{ColumnFilter, FilterHeader};
use crate::record::TableRecord;
use crate::selection::SelectionColumn;
use crate::sorter::{SortHeader, SortOrder, Sorter};
use crate::value::Value;

pub use title::{TitleContext, title_transform};

/// Side a column is frozen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fixed {
    Left,
    Right,
}

/// Renders a cell: `(value, record, index) -> text`.
pub type CellRenderer<R> = Arc<dyn Fn(Option<&Value>, &R, usize) -> String + Send + Sync>;

/// Produces a header title from the current sort/filter context.
pub type TitleFn = Arc<dyn Fn(&TitleContext) -> String + Send + Sync>;

/// Column header title.
#[derive(Clone)]
pub enum Title {
    /// Plain text.
    Text(String),
    /// Computed by the title transform from the current sort/filter state.
    Dynamic(TitleFn),
}

impl Title {
    /// Text of a resolved title, `None` while still dynamic.
    pub fn text(&self) -> Option<&str> {
        match self {
            Title::Text(s) => Some(s),
            Title::Dynamic(_) => None,
        }
    }
}

impl Default for Title {
    fn default() -> Self {
        Title::Text(String::new())
    }
}

impl fmt::Debug for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Title::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Title::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Title {
    fn from(s: &str) -> Self {
        Title::Text(s.to_string())
    }
}

impl From<String> for Title {
    fn from(s: String) -> Self {
        Title::Text(s)
    }
}

/// A column displaying one field of each row.
///
/// # Example
///
/// ```
/// use gridstate::{Column, Record, Sorter, SortOrder};
///
/// let age = Column::<Record>::new("Age")
///     .data_index("age")
///     .sorter(Sorter::by_field("age"))
///     .default_sort_order(SortOrder::Ascend);
/// ```
#[derive(Clone)]
pub struct Column<R> {
    /// Explicit column key. Falls back to `data_index`, then to position.
    pub key: Option<String>,
    /// Field read from each row.
    pub data_index: Option<String>,
    pub title: Title,
    pub width: Option<u32>,
    pub fixed: Option<Fixed>,
    /// Custom cell renderer.
    pub render: Option<CellRenderer<R>>,
    pub sorter: Option<Sorter<R>>,
    /// Controlled sort order. `Some(None)` pins the column unsorted.
    pub sort_order: Option<Option<SortOrder>>,
    /// Initial sort order when uncontrolled.
    pub default_sort_order: Option<SortOrder>,
    /// Sort cycle for this column, overriding the table default.
    pub sort_directions: Option<Vec<SortOrder>>,
    pub filter: Option<ColumnFilter<R>>,
    /// Set by the sorter transform.
    pub sort_header: Option<SortHeader>,
    /// Set by the filter transform.
    pub filter_header: Option<FilterHeader>,
    /// Attributes the engines do not interpret, passed through untouched.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl<R> Column<R> {
    /// Create a column with a title.
    pub fn new(title: impl Into<Title>) -> Self {
        Self {
            key: None,
            data_index: None,
            title: title.into(),
            width: None,
            fixed: None,
            render: None,
            sorter: None,
            sort_order: None,
            default_sort_order: None,
            sort_directions: None,
            filter: None,
            sort_header: None,
            filter_header: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn data_index(mut self, field: impl Into<String>) -> Self {
        self.data_index = Some(field.into());
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn fixed(mut self, fixed: Fixed) -> Self {
        self.fixed = Some(fixed);
        self
    }

    /// Title computed from the current sort/filter state.
    pub fn dynamic_title<F>(mut self, f: F) -> Self
    where
        F: Fn(&TitleContext) -> String + Send + Sync + 'static,
    {
        self.title = Title::Dynamic(Arc::new(f));
        self
    }

    pub fn render<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&Value>, &R, usize) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(f));
        self
    }

    pub fn sorter(mut self, sorter: Sorter<R>) -> Self {
        self.sorter = Some(sorter);
        self
    }

    /// Control the sort order from outside.
    pub fn sort_order(mut self, order: Option<SortOrder>) -> Self {
        self.sort_order = Some(order);
        self
    }

    pub fn default_sort_order(mut self, order: SortOrder) -> Self {
        self.default_sort_order = Some(order);
        self
    }

    pub fn sort_directions(mut self, directions: Vec<SortOrder>) -> Self {
        self.sort_directions = Some(directions);
        self
    }

    pub fn filter(mut self, filter: ColumnFilter<R>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Attach an attribute the engines pass through untouched.
    pub fn extra(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

impl<R: TableRecord> Column<R> {
    /// Value of this column's field in a row.
    pub fn cell_value<'a>(&self, record: &'a R) -> Option<&'a Value> {
        self.data_index.as_deref().and_then(|field| record.field(field))
    }

    /// Render a cell through the custom renderer, or as the field's text.
    pub fn render_cell(&self, record: &R, index: usize) -> String {
        let value = self.cell_value(record);
        match &self.render {
            Some(render) => render(value, record, index),
            None => value.map(Value::to_string).unwrap_or_default(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("data_index", &self.data_index)
            .field("title", &self.title)
            .field("fixed", &self.fixed)
            .field("sortable", &self.sorter.is_some())
            .field("filterable", &self.filter.is_some())
            .field("sort_header", &self.sort_header)
            .field("filter_header", &self.filter_header)
            .finish()
    }
}

/// A header spanning nested columns.
#[derive(Clone)]
pub struct ColumnGroup<R> {
    pub key: Option<String>,
    pub title: Title,
    pub fixed: Option<Fixed>,
    pub children: Vec<ColumnDescriptor<R>>,
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl<R> ColumnGroup<R> {
    pub fn new(title: impl Into<Title>, children: Vec<ColumnDescriptor<R>>) -> Self {
        Self {
            key: None,
            title: title.into(),
            fixed: None,
            children,
            extra: BTreeMap::new(),
        }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn fixed(mut self, fixed: Fixed) -> Self {
        self.fixed = Some(fixed);
        self
    }
}

impl<R> fmt::Debug for ColumnGroup<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnGroup")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("fixed", &self.fixed)
            .field("children", &self.children)
            .finish()
    }
}

/// The row-expand toggle column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandColumn {
    pub fixed: Option<Fixed>,
}

/// One entry of a column list.
#[derive(Clone)]
pub enum ColumnDescriptor<R> {
    Data(Column<R>),
    Group(ColumnGroup<R>),
    Expand(ExpandColumn),
    /// Placeholder for the selection column.
    SelectionMarker,
    /// Concrete selection column produced by the selection transform.
    Selection(SelectionColumn<R>),
}

impl<R> ColumnDescriptor<R> {
    /// Frozen side of this column, if any.
    pub fn fixed(&self) -> Option<Fixed> {
        match self {
            ColumnDescriptor::Data(c) => c.fixed,
            ColumnDescriptor::Group(g) => g.fixed,
            ColumnDescriptor::Expand(e) => e.fixed,
            ColumnDescriptor::SelectionMarker => None,
            ColumnDescriptor::Selection(s) => s.fixed,
        }
    }

    pub fn is_selection_marker(&self) -> bool {
        matches!(self, ColumnDescriptor::SelectionMarker)
    }

    pub fn is_expand(&self) -> bool {
        matches!(self, ColumnDescriptor::Expand(_))
    }

    pub fn as_data(&self) -> Option<&Column<R>> {
        match self {
            ColumnDescriptor::Data(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&ColumnGroup<R>> {
        match self {
            ColumnDescriptor::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_selection(&self) -> Option<&SelectionColumn<R>> {
        match self {
            ColumnDescriptor::Selection(s) => Some(s),
            _ => None,
        }
    }
}

impl<R> From<Column<R>> for ColumnDescriptor<R> {
    fn from(column: Column<R>) -> Self {
        ColumnDescriptor::Data(column)
    }
}

impl<R> From<ColumnGroup<R>> for ColumnDescriptor<R> {
    fn from(group: ColumnGroup<R>) -> Self {
        ColumnDescriptor::Group(group)
    }
}

impl<R> fmt::Debug for ColumnDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDescriptor::Data(c) => fmt::Debug::fmt(c, f),
            ColumnDescriptor::Group(g) => fmt::Debug::fmt(g, f),
            ColumnDescriptor::Expand(e) => fmt::Debug::fmt(e, f),
            ColumnDescriptor::SelectionMarker => f.write_str("SelectionMarker"),
            ColumnDescriptor::Selection(s) => fmt::Debug::fmt(s, f),
        }
    }
}

/// Position path of a column: `"0"`, `"1-0"`, ...
pub fn column_pos(index: usize, parent: Option<&str>) -> String {
    match parent {
        Some(pos) => format!("{}-{}", pos, index),
        None => index.to_string(),
    }
}

/// Key identifying a data column: explicit key, else data index, else position.
pub fn column_key<R>(column: &Column<R>, pos: &str) -> String {
    column
        .key
        .clone()
        .or_else(|| column.data_index.clone())
        .unwrap_or_else(|| pos.to_string())
}

/// Visit every data column with its resolved key, descending into groups.
pub(crate) fn for_each_column<'a, R, F>(columns: &'a [ColumnDescriptor<R>], f: &mut F)
where
    F: FnMut(&'a Column<R>, String),
{
    fn inner<'a, R, F>(columns: &'a [ColumnDescriptor<R>], parent: Option<&str>, f: &mut F)
    where
        F: FnMut(&'a Column<R>, String),
    {
        for (index, descriptor) in columns.iter().enumerate() {
            let pos = column_pos(index, parent);
            match descriptor {
                ColumnDescriptor::Data(column) => f(column, column_key(column, &pos)),
                ColumnDescriptor::Group(group) => inner(&group.children, Some(pos.as_str()), f),
                _ => {}
            }
        }
    }

    inner(columns, None, f);
}

/// Rebuild a column list, passing every data column through `f`.
pub(crate) fn map_columns<R, F>(columns: Vec<ColumnDescriptor<R>>, f: &mut F) -> Vec<ColumnDescriptor<R>>
where
    F: FnMut(Column<R>, &str) -> Column<R>,
{
    fn inner<R, F>(
        columns: Vec<ColumnDescriptor<R>>,
        parent: Option<&str>,
        f: &mut F,
    ) -> Vec<ColumnDescriptor<R>>
    where
        F: FnMut(Column<R>, &str) -> Column<R>,
    {
        columns
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| {
                let pos = column_pos(index, parent);
                match descriptor {
                    ColumnDescriptor::Data(column) => {
                        let key = column_key(&column, &pos);
                        ColumnDescriptor::Data(f(column, &key))
                    }
                    ColumnDescriptor::Group(mut group) => {
                        group.children = inner(group.children, Some(pos.as_str()), f);
                        ColumnDescriptor::Group(group)
                    }
                    other => other,
                }
            })
            .collect()
    }

    inner(columns, None, f)
}

/// Reject column lists whose selection markers cannot be resolved.
///
/// Markers are only meaningful at the top level; a marker inside a group is
/// a configuration fault.
pub fn validate_columns<R>(columns: &[ColumnDescriptor<R>]) -> Result<()> {
    for descriptor in columns {
        if let ColumnDescriptor::Group(group) = descriptor {
            check_group(group)?;
        }
    }
    Ok(())
}

fn check_group<R>(group: &ColumnGroup<R>) -> Result<()> {
    for child in &group.children {
        match child {
            ColumnDescriptor::SelectionMarker => {
                let name = group
                    .key
                    .clone()
                    .or_else(|| group.title.text().map(str::to_string))
                    .unwrap_or_default();
                return Err(TableError::NestedSelectionColumn { group: name });
            }
            ColumnDescriptor::Group(inner) => check_group(inner)?,
            _ => {}
        }
    }
    Ok(())
}

/// Remove every selection marker, including stray ones inside groups.
pub fn strip_selection_markers<R>(columns: Vec<ColumnDescriptor<R>>) -> Vec<ColumnDescriptor<R>> {
    columns
        .into_iter()
        .filter(|c| !c.is_selection_marker())
        .map(|c| match c {
            ColumnDescriptor::Group(mut group) => {
                let before = group.children.len();
                group.children = strip_selection_markers(group.children);
                if group.children.len() != before {
                    warn!("Selection marker inside column group removed");
                }
                ColumnDescriptor::Group(group)
            }
            other => other,
        })
        .collect()
}
