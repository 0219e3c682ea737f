//! Interaction inputs and change notifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pagination::PaginationState;
use crate::sorter::SorterInfo;
use crate::value::Value;

/// Modifier keys held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Default::default()
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Default::default()
        }
    }

    /// Check if any modifier is active
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }

    /// Check whether a specific modifier is held.
    pub fn has(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Shift => self.shift,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
            ModifierKey::Meta => self.meta,
        }
    }
}

/// A single modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Shift,
    Ctrl,
    Alt,
    Meta,
}

/// How a selection change came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSelectMethod {
    /// Select-all checkbox or "select all data" item.
    All,
    /// "Clear all" item.
    None,
    /// "Invert current page" item.
    Invert,
    /// One row toggled.
    Single,
    /// Shift-click range.
    Multiple,
}

/// Extra information passed with a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionInfo {
    pub method: RowSelectMethod,
}

/// What triggered a table change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableAction {
    Paginate,
    Sort,
    Filter,
}

/// Payload of the table's combined change notification.
#[derive(Debug, Clone)]
pub struct ChangeInfo<R> {
    /// Pagination after the change, `None` when pagination is disabled.
    pub pagination: Option<PaginationState>,
    /// Committed filter values per filterable column.
    pub filters: BTreeMap<String, Option<Vec<Value>>>,
    pub sorter: SorterInfo,
    /// All rows after sorting and filtering, before pagination.
    pub current_data_source: Vec<R>,
    pub action: TableAction,
}
