//! Sorter engine: tracks per-column sort state and handles header clicks.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::{CompareFn, DEFAULT_SORT_DIRECTIONS, SortClause, SortOrder, SortState, next_sort_direction};
use crate::column::{Column, ColumnDescriptor, for_each_column, map_columns};
use crate::events::{ModifierKey, Modifiers};
use crate::locale::TableLocale;

/// Decides whether a header click keeps other columns' sort clauses.
///
/// A click that does not trigger multi-sort clears every other clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiSortTrigger {
    /// Keep other clauses only while the modifier is held, and only for
    /// columns that declare a `multiple` priority.
    Modifier(ModifierKey),
    /// Keep other clauses whenever both the clicked column and the other
    /// column declare a `multiple` priority.
    Declared,
}

impl Default for MultiSortTrigger {
    fn default() -> Self {
        MultiSortTrigger::Modifier(ModifierKey::Shift)
    }
}

/// Table-wide sorter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SorterConfig {
    /// Click cycle for columns that do not declare their own.
    pub sort_directions: Vec<SortOrder>,
    pub multi_sort: MultiSortTrigger,
    /// Attach the next-action tooltip to sort headers.
    pub show_tooltip: bool,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            sort_directions: DEFAULT_SORT_DIRECTIONS.to_vec(),
            multi_sort: MultiSortTrigger::default(),
            show_tooltip: true,
        }
    }
}

impl SorterConfig {
    pub fn sort_directions(mut self, directions: Vec<SortOrder>) -> Self {
        self.sort_directions = directions;
        self
    }

    pub fn multi_sort(mut self, trigger: MultiSortTrigger) -> Self {
        self.multi_sort = trigger;
        self
    }

    pub fn show_tooltip(mut self, show: bool) -> Self {
        self.show_tooltip = show;
        self
    }
}

/// Sort affordance attached to a sortable column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortHeader {
    /// Current order, `None` when unsorted.
    pub order: Option<SortOrder>,
    /// Order a click would switch to.
    pub next_order: Option<SortOrder>,
    /// Click cycle of the column.
    pub directions: Vec<SortOrder>,
    pub tooltip: Option<String>,
}

/// Sort state of one column as reported to change callbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SorterResult {
    pub column_key: Option<String>,
    /// Data index of the column.
    pub field: Option<String>,
    pub order: Option<SortOrder>,
}

/// Sorter payload of a change notification: one result, or a list when
/// several columns are sorted at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SorterInfo {
    Single(SorterResult),
    Multiple(Vec<SorterResult>),
}

impl Default for SorterInfo {
    fn default() -> Self {
        SorterInfo::Single(SorterResult::default())
    }
}

struct SortableColumn<R> {
    key: String,
    data_index: Option<String>,
    compare: Option<CompareFn<R>>,
    multiple: Option<u32>,
    controlled: Option<Option<SortOrder>>,
    directions: Option<Vec<SortOrder>>,
}

impl<R> SortableColumn<R> {
    fn from_column(column: &Column<R>, key: String) -> Option<Self> {
        let sorter = column.sorter.as_ref()?;
        Some(Self {
            key,
            data_index: column.data_index.clone(),
            compare: sorter.compare.clone(),
            multiple: sorter.multiple,
            controlled: column.sort_order,
            directions: column.sort_directions.clone(),
        })
    }
}

/// Owns the sort state of one table.
pub struct SorterEngine<R> {
    columns: Vec<SortableColumn<R>>,
    states: Vec<SortState>,
    config: SorterConfig,
}

impl<R> SorterEngine<R> {
    /// Collect the sortable columns and seed state from `default_sort_order`.
    pub fn new(columns: &[ColumnDescriptor<R>], config: SorterConfig) -> Self {
        let mut engine = Self {
            columns: Vec::new(),
            states: Vec::new(),
            config,
        };
        engine.collect(columns);
        engine.states = engine.default_states(columns);
        engine
    }

    /// Pick up a changed column list.
    ///
    /// Internal state of columns that are no longer sortable is dropped;
    /// controlled orders are re-read.
    pub fn set_columns(&mut self, columns: &[ColumnDescriptor<R>]) {
        self.collect(columns);
        let sortable: Vec<&str> = self.columns.iter().map(|c| c.key.as_str()).collect();
        self.states.retain(|s| sortable.contains(&s.column_key.as_str()));
    }

    fn collect(&mut self, columns: &[ColumnDescriptor<R>]) {
        let mut sortable = Vec::new();
        for_each_column(columns, &mut |column, key| {
            if let Some(c) = SortableColumn::from_column(column, key) {
                sortable.push(c);
            }
        });
        self.columns = sortable;
    }

    fn default_states(&self, columns: &[ColumnDescriptor<R>]) -> Vec<SortState> {
        let mut states = Vec::new();
        for_each_column(columns, &mut |column, key| {
            if let (Some(sorter), Some(order)) = (&column.sorter, column.default_sort_order) {
                states.push(SortState {
                    column_key: key,
                    order: Some(order),
                    multiple: sorter.multiple,
                    priority: 0,
                });
            }
        });
        states
    }

    fn column(&self, key: &str) -> Option<&SortableColumn<R>> {
        self.columns.iter().find(|c| c.key == key)
    }

    fn directions_of(&self, column: &SortableColumn<R>) -> Vec<SortOrder> {
        column
            .directions
            .clone()
            .unwrap_or_else(|| self.config.sort_directions.clone())
    }

    /// Effective sort states with priorities assigned.
    ///
    /// Controlled columns take precedence over internal state. When several
    /// controlled columns are sorted, only those declaring `multiple` stay
    /// active once a multi-sort column has been seen; a sorted column
    /// without `multiple` disables every later one.
    pub fn sort_states(&self) -> Vec<SortState> {
        let controlled: Vec<SortState> = self
            .columns
            .iter()
            .filter_map(|c| {
                c.controlled.map(|order| SortState {
                    column_key: c.key.clone(),
                    order,
                    multiple: c.multiple,
                    priority: 0,
                })
            })
            .collect();

        let mut states = if controlled.is_empty() {
            self.states.clone()
        } else {
            validate_controlled(controlled)
        };

        assign_priorities(&mut states);
        states
    }

    /// Active clauses for [`sort_rows`](super::sort_rows). Columns without a
    /// comparator are tracked but not applied.
    pub fn clauses(&self) -> Vec<SortClause<R>> {
        let mut clauses: Vec<SortClause<R>> = self
            .sort_states()
            .into_iter()
            .filter_map(|state| {
                let order = state.order?;
                let compare = self.column(&state.column_key)?.compare.clone()?;
                Some(SortClause {
                    column_key: state.column_key,
                    order,
                    priority: state.priority,
                    compare,
                })
            })
            .collect();
        clauses.sort_by_key(|c| c.priority);
        trace!("{} sort clause(s) active", clauses.len());
        clauses
    }

    /// Sorted columns as `(key, order)`, first-applied first.
    pub fn sort_columns(&self) -> Vec<(String, SortOrder)> {
        let mut states: Vec<SortState> = self
            .sort_states()
            .into_iter()
            .filter(|s| s.order.is_some())
            .collect();
        states.sort_by_key(|s| s.priority);
        states
            .into_iter()
            .filter_map(|s| s.order.map(|order| (s.column_key, order)))
            .collect()
    }

    /// Current order of a column.
    pub fn order_of(&self, column_key: &str) -> Option<SortOrder> {
        self.sort_states()
            .into_iter()
            .find(|s| s.column_key == column_key)
            .and_then(|s| s.order)
    }

    /// Advance a column through its click cycle.
    ///
    /// Returns the new internal states, or `None` when the column is not
    /// sortable. For controlled columns the returned states describe the
    /// requested change; the effective order follows the controlled value
    /// until the host updates it.
    pub fn on_header_click(&mut self, column_key: &str, modifiers: Modifiers) -> Option<Vec<SortState>> {
        let column = self.column(column_key)?;
        let directions = self.directions_of(column);
        let multiple = column.multiple;
        let next = next_sort_direction(&directions, self.order_of(column_key));

        let clicked = SortState {
            column_key: column_key.to_string(),
            order: next,
            multiple,
            priority: 0,
        };

        let keep_others = match self.config.multi_sort {
            MultiSortTrigger::Modifier(key) => multiple.is_some() && modifiers.has(key),
            MultiSortTrigger::Declared => multiple.is_some(),
        };

        let mut states: Vec<SortState> = if keep_others {
            self.sort_states()
                .into_iter()
                .filter(|s| s.column_key != column_key && s.multiple.is_some())
                .collect()
        } else {
            Vec::new()
        };
        states.push(clicked);
        assign_priorities(&mut states);

        debug!("Sort on '{}' -> {:?} ({} clause(s))", column_key, next, states.len());
        self.states = states.clone();
        Some(states)
    }

    /// Sorter payload for a change notification.
    pub fn sorter_info(&self) -> SorterInfo {
        let states = self.sort_states();
        let mut sorted: Vec<&SortState> = states.iter().filter(|s| s.order.is_some()).collect();
        sorted.sort_by_key(|s| s.priority);

        let result = |state: &SortState| SorterResult {
            column_key: Some(state.column_key.clone()),
            field: self.column(&state.column_key).and_then(|c| c.data_index.clone()),
            order: state.order,
        };

        match sorted.as_slice() {
            [] => match states.last() {
                Some(last) => SorterInfo::Single(SorterResult {
                    order: None,
                    ..result(last)
                }),
                None => SorterInfo::default(),
            },
            [single] => SorterInfo::Single(result(single)),
            many => SorterInfo::Multiple(many.iter().map(|s| result(s)).collect()),
        }
    }

    /// Annotate sortable columns with their [`SortHeader`].
    pub fn transform_columns(&self, columns: Vec<ColumnDescriptor<R>>, locale: &TableLocale) -> Vec<ColumnDescriptor<R>> {
        let states = self.sort_states();
        map_columns(columns, &mut |mut column, key| {
            let Some(sortable) = self.column(key) else {
                return column;
            };
            let directions = self.directions_of(sortable);
            let order = states
                .iter()
                .find(|s| s.column_key == key)
                .and_then(|s| s.order);
            let next_order = next_sort_direction(&directions, order);
            let tooltip = self.config.show_tooltip.then(|| match next_order {
                Some(SortOrder::Ascend) => locale.trigger_asc.clone(),
                Some(SortOrder::Descend) => locale.trigger_desc.clone(),
                None => locale.cancel_sort.clone(),
            });
            column.sort_header = Some(SortHeader {
                order,
                next_order,
                directions,
                tooltip,
            });
            column
        })
    }

    pub fn config(&self) -> &SorterConfig {
        &self.config
    }
}

fn validate_controlled(controlled: Vec<SortState>) -> Vec<SortState> {
    let mut validated = Vec::with_capacity(controlled.len());
    let mut valid = true;
    let mut multiple_mode = false;

    for mut state in controlled {
        if multiple_mode && state.multiple.is_none() {
            valid = false;
        }
        if !valid {
            state.order = None;
        }
        if !multiple_mode && state.order.is_some() {
            if state.multiple.is_some() {
                multiple_mode = true;
            } else {
                valid = false;
            }
        }
        validated.push(state);
    }

    validated
}

/// Rank states by declared `multiple`, highest first; ties keep their order.
fn assign_priorities(states: &mut [SortState]) {
    let mut ranked: Vec<usize> = (0..states.len()).collect();
    ranked.sort_by_key(|&i| std::cmp::Reverse(states[i].multiple.unwrap_or(0)));
    for (rank, index) in ranked.into_iter().enumerate() {
        states[index].priority = rank;
    }
}
