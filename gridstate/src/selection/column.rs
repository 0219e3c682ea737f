//! The selection column: header and cell state, and its placement in the
//! column list.

use std::fmt;
use std::sync::Arc;

use log::warn;

use super::SelectionType;
use crate::column::{ColumnDescriptor, Fixed, strip_selection_markers};
use crate::key::Key;

/// Checkbox (or radio) state of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCell {
    /// `None` for rows without a key; such rows cannot be selected.
    pub key: Option<Key>,
    pub selection_type: SelectionType,
    pub checked: bool,
    pub indeterminate: bool,
    pub disabled: bool,
    pub name: Option<String>,
}

/// An entry of the selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionMenuItem {
    pub key: String,
    pub label: String,
}

/// State of the select-all checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectAllHeader {
    pub checked: bool,
    pub indeterminate: bool,
    pub disabled: bool,
    /// Selection menu next to the checkbox, empty when there is none.
    pub menu: Vec<SelectionMenuItem>,
}

/// Resolves the selection cell of a row: `(row, index) -> cell`.
pub type SelectionRenderFn<R> = Arc<dyn Fn(&R, usize) -> SelectionCell + Send + Sync>;

/// The concrete selection column.
#[derive(Clone)]
pub struct SelectionColumn<R> {
    pub fixed: Option<Fixed>,
    pub width: Option<u32>,
    /// Custom title replacing the select-all checkbox.
    pub title: Option<String>,
    /// Select-all checkbox, `None` in radio mode or when hidden.
    pub header: Option<SelectAllHeader>,
    pub render: SelectionRenderFn<R>,
}

impl<R> SelectionColumn<R> {
    /// Selection state of a row.
    pub fn cell(&self, record: &R, index: usize) -> SelectionCell {
        (self.render)(record, index)
    }
}

impl<R> fmt::Debug for SelectionColumn<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionColumn")
            .field("fixed", &self.fixed)
            .field("width", &self.width)
            .field("title", &self.title)
            .field("header", &self.header)
            .finish()
    }
}

/// Put `column` in place of the selection marker.
///
/// Without a marker the column goes first, or second when the list starts
/// with the expand column. Extra markers are removed. An unset `fixed`
/// side is taken from the following column, else the preceding one, and a
/// preceding expand column without a side adopts it.
pub(crate) fn place_selection_column<R>(
    columns: Vec<ColumnDescriptor<R>>,
    mut column: SelectionColumn<R>,
) -> Vec<ColumnDescriptor<R>> {
    let mut columns: Vec<ColumnDescriptor<R>> = columns
        .into_iter()
        .map(|descriptor| match descriptor {
            ColumnDescriptor::Group(mut group) => {
                let before = group.children.len();
                group.children = strip_selection_markers(group.children);
                if group.children.len() != before {
                    warn!("Selection marker inside a column group ignored");
                }
                ColumnDescriptor::Group(group)
            }
            other => other,
        })
        .collect();

    if !columns.iter().any(ColumnDescriptor::is_selection_marker) {
        let at = match columns.first() {
            Some(first) if first.is_expand() => 1,
            _ => 0,
        };
        columns.insert(at, ColumnDescriptor::SelectionMarker);
    }

    let Some(index) = columns.iter().position(ColumnDescriptor::is_selection_marker) else {
        return columns;
    };

    let markers = columns.iter().filter(|c| c.is_selection_marker()).count();
    if markers > 1 {
        warn!("{} selection markers in column list, keeping the first", markers);
        let mut seen = false;
        columns.retain(|c| {
            if !c.is_selection_marker() {
                return true;
            }
            let keep = !seen;
            seen = true;
            keep
        });
    }

    let next = columns.get(index + 1).and_then(ColumnDescriptor::fixed);
    let prev = index.checked_sub(1).and_then(|i| columns.get(i)).and_then(ColumnDescriptor::fixed);
    let fixed = column.fixed.or(next).or(prev);
    column.fixed = fixed;

    if let (Some(side), Some(prev_index)) = (fixed, index.checked_sub(1)) {
        if let Some(ColumnDescriptor::Expand(expand)) = columns.get_mut(prev_index) {
            if expand.fixed.is_none() {
                expand.fixed = Some(side);
            }
        }
    }

    columns[index] = ColumnDescriptor::Selection(column);
    columns
}
