//! Column sorting: sort clauses, the comparator chain, and the sorter engine.

mod state;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::record::TableRecord;
use crate::value::Value;

pub use state::{MultiSortTrigger, SortHeader, SorterConfig, SorterEngine, SorterInfo, SorterResult};

/// Sort direction of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order (A-Z, 0-9).
    Ascend,
    /// Descending order (Z-A, 9-0).
    Descend,
}

/// Default click cycle: ascend, descend, then unsorted.
pub const DEFAULT_SORT_DIRECTIONS: [SortOrder; 2] = [SortOrder::Ascend, SortOrder::Descend];

/// Compares two rows in ascending sense. The active order is passed for
/// comparators that want to treat it specially; the engine reverses the
/// result itself for [`SortOrder::Descend`].
pub type CompareFn<R> = Arc<dyn Fn(&R, &R, SortOrder) -> Ordering + Send + Sync>;

/// Sorting capability of a column.
pub struct Sorter<R> {
    /// Comparator. `None` tracks sort state without reordering rows
    /// (for data sorted elsewhere).
    pub compare: Option<CompareFn<R>>,
    /// Multi-sort priority; higher values are compared first.
    pub multiple: Option<u32>,
}

impl<R> Clone for Sorter<R> {
    fn clone(&self) -> Self {
        Self {
            compare: self.compare.clone(),
            multiple: self.multiple,
        }
    }
}

impl<R> Sorter<R> {
    /// Sort with a custom comparator.
    pub fn new<F>(compare: F) -> Self
    where
        F: Fn(&R, &R, SortOrder) -> Ordering + Send + Sync + 'static,
    {
        Self {
            compare: Some(Arc::new(compare)),
            multiple: None,
        }
    }

    /// Track sort state only; rows are sorted by whoever supplies them.
    pub fn server() -> Self {
        Self {
            compare: None,
            multiple: None,
        }
    }

    /// Allow this column to take part in multi-column sorting.
    pub fn multiple(mut self, priority: u32) -> Self {
        self.multiple = Some(priority);
        self
    }
}

impl<R: TableRecord> Sorter<R> {
    /// Compare rows by a field using [`Value::compare`]. Missing fields sort as null.
    pub fn by_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(move |a: &R, b: &R, _order| {
            let left = a.field(&field).unwrap_or(&Value::Null);
            let right = b.field(&field).unwrap_or(&Value::Null);
            left.compare(right)
        })
    }
}

impl<R> fmt::Debug for Sorter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sorter")
            .field("compare", &self.compare.is_some())
            .field("multiple", &self.multiple)
            .finish()
    }
}

/// Sort state of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column_key: String,
    /// `None` means the column is currently unsorted.
    pub order: Option<SortOrder>,
    /// Declared multi-sort priority of the column.
    pub multiple: Option<u32>,
    /// Rank in the comparator chain; 0 is compared first.
    pub priority: usize,
}

/// One link of the comparator chain.
pub struct SortClause<R> {
    pub column_key: String,
    pub order: SortOrder,
    /// Rank in the chain; lower ranks are compared first.
    pub priority: usize,
    pub compare: CompareFn<R>,
}

impl<R> Clone for SortClause<R> {
    fn clone(&self) -> Self {
        Self {
            column_key: self.column_key.clone(),
            order: self.order,
            priority: self.priority,
            compare: Arc::clone(&self.compare),
        }
    }
}

impl<R> fmt::Debug for SortClause<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortClause")
            .field("column_key", &self.column_key)
            .field("order", &self.order)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Next order in a column's click cycle.
///
/// From unsorted the first direction is chosen; after the last direction
/// the column returns to unsorted.
pub fn next_sort_direction(directions: &[SortOrder], current: Option<SortOrder>) -> Option<SortOrder> {
    match current {
        None => directions.first().copied(),
        Some(order) => directions
            .iter()
            .position(|d| *d == order)
            .and_then(|i| directions.get(i + 1))
            .copied(),
    }
}

/// Stable multi-clause sort.
///
/// Clauses apply in ascending priority; the first non-equal comparison
/// wins and full ties keep their input order. Tree data is sorted level by
/// level: children are reordered within their own parent only.
pub fn sort_rows<R: TableRecord>(rows: &[R], clauses: &[SortClause<R>], children_column: &str) -> Vec<R> {
    if clauses.is_empty() {
        return rows.to_vec();
    }

    let mut chain: Vec<&SortClause<R>> = clauses.iter().collect();
    chain.sort_by_key(|c| c.priority);

    sort_level(rows, &chain, children_column)
}

fn sort_level<R: TableRecord>(rows: &[R], chain: &[&SortClause<R>], children_column: &str) -> Vec<R> {
    let mut sorted: Vec<&R> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        for clause in chain {
            let ordering = (clause.compare)(a, b, clause.order);
            if ordering != Ordering::Equal {
                return match clause.order {
                    SortOrder::Ascend => ordering,
                    SortOrder::Descend => ordering.reverse(),
                };
            }
        }
        Ordering::Equal
    });

    sorted
        .into_iter()
        .map(|row| match row.children(children_column) {
            Some(children) => {
                let children = sort_level(children, chain, children_column);
                row.with_children(children_column, children)
            }
            None => row.clone(),
        })
        .collect()
}
