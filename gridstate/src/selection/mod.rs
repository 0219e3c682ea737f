//! Row selection: settings, the selection engine, and the selection column.

mod column;
mod config;
mod state;

pub use column::{SelectAllHeader, SelectionCell, SelectionColumn, SelectionMenuItem, SelectionRenderFn};
pub use config::{
    CheckboxProps, CheckboxPropsFn, CustomSelection, RowSelection, SelectFn, SelectNoneFn, SelectionCellFn,
    SelectionChangeFn, SelectionItem, SelectionItemFn, SelectionType, Selections,
};
pub use state::SelectionEngine;
