//! Row selection settings.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::SelectionCell;
use crate::column::Fixed;
use crate::events::{Modifiers, SelectionInfo};
use crate::key::Key;

/// Checkbox or radio selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    #[default]
    Checkbox,
    Radio,
}

/// Per-row checkbox settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckboxProps {
    /// A disabled row is never toggled by bulk operations or conduction.
    pub disabled: bool,
    pub name: Option<String>,
    /// Overrides the computed half-checked state of the row.
    pub indeterminate: Option<bool>,
}

impl CheckboxProps {
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Default::default()
        }
    }
}

pub type CheckboxPropsFn<R> = Arc<dyn Fn(&R) -> CheckboxProps + Send + Sync>;

/// `(selected keys, selected rows, info)`.
pub type SelectionChangeFn<R> = Arc<dyn Fn(&[Key], &[R], SelectionInfo) + Send + Sync>;

/// `(row, selected, all selected rows, modifiers)`, fired for single-row toggles.
pub type SelectFn<R> = Arc<dyn Fn(&R, bool, &[R], Modifiers) + Send + Sync>;

pub type SelectNoneFn = Arc<dyn Fn() + Send + Sync>;

/// Post-processes the selection cell of a row: `(cell, row, index) -> cell`.
pub type SelectionCellFn<R> = Arc<dyn Fn(SelectionCell, &R, usize) -> SelectionCell + Send + Sync>;

/// Handler of a custom selection menu item, given the enabled row keys of
/// the current page.
pub type SelectionItemFn = Arc<dyn Fn(&[Key]) + Send + Sync>;

/// A host-defined entry of the selection menu.
#[derive(Clone)]
pub struct CustomSelection {
    pub key: String,
    pub text: String,
    pub on_select: Option<SelectionItemFn>,
}

impl CustomSelection {
    pub fn new<F>(key: impl Into<String>, text: impl Into<String>, on_select: F) -> Self
    where
        F: Fn(&[Key]) + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            text: text.into(),
            on_select: Some(Arc::new(on_select)),
        }
    }
}

impl fmt::Debug for CustomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomSelection")
            .field("key", &self.key)
            .field("text", &self.text)
            .finish()
    }
}

/// One entry of the selection menu.
#[derive(Debug, Clone)]
pub enum SelectionItem {
    /// Select every enabled row of the data set.
    All,
    /// Invert the enabled rows of the current page.
    Invert,
    /// Clear everything except disabled rows.
    None,
    Custom(CustomSelection),
}

/// Which selection menu to offer next to the select-all checkbox.
#[derive(Debug, Clone, Default)]
pub enum Selections {
    #[default]
    Off,
    /// All, Invert, None.
    Builtin,
    Items(Vec<SelectionItem>),
}

impl Selections {
    pub(crate) fn items(&self) -> Vec<SelectionItem> {
        match self {
            Selections::Off => Vec::new(),
            Selections::Builtin => vec![SelectionItem::All, SelectionItem::Invert, SelectionItem::None],
            Selections::Items(items) => items.clone(),
        }
    }
}

/// Row selection settings of a table.
///
/// ```
/// use gridstate::{Key, Record, RowSelection, Selections};
///
/// let selection = RowSelection::<Record>::new()
///     .default_selected_row_keys(vec![Key::from(1)])
///     .selections(Selections::Builtin)
///     .on_change(|keys, _rows, info| println!("{:?} via {:?}", keys, info.method));
/// assert!(selection.check_strictly);
/// ```
#[derive(Clone)]
pub struct RowSelection<R> {
    pub selection_type: SelectionType,
    /// Controlled selection. When set, interactions report changes but the
    /// selection only moves when the host updates this value.
    pub selected_row_keys: Option<Vec<Key>>,
    pub default_selected_row_keys: Vec<Key>,
    /// Keep selected keys (and their rows) for rows no longer in the data.
    pub preserve_selected_row_keys: bool,
    /// Parent and child rows select independently. When off, checks are
    /// conducted through the row tree.
    pub check_strictly: bool,
    pub checkbox_props: Option<CheckboxPropsFn<R>>,
    pub on_change: Option<SelectionChangeFn<R>>,
    pub on_select: Option<SelectFn<R>>,
    pub on_select_none: Option<SelectNoneFn>,
    pub selections: Selections,
    pub hide_select_all: bool,
    pub fixed: Option<Fixed>,
    pub column_width: Option<u32>,
    /// Replaces the select-all checkbox as the column title.
    pub column_title: Option<String>,
    pub render_cell: Option<SelectionCellFn<R>>,
}

impl<R> Default for RowSelection<R> {
    fn default() -> Self {
        Self {
            selection_type: SelectionType::Checkbox,
            selected_row_keys: None,
            default_selected_row_keys: Vec::new(),
            preserve_selected_row_keys: false,
            check_strictly: true,
            checkbox_props: None,
            on_change: None,
            on_select: None,
            on_select_none: None,
            selections: Selections::Off,
            hide_select_all: false,
            fixed: None,
            column_width: None,
            column_title: None,
            render_cell: None,
        }
    }
}

impl<R> RowSelection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radio() -> Self {
        Self {
            selection_type: SelectionType::Radio,
            ..Self::default()
        }
    }

    pub fn selection_type(mut self, selection_type: SelectionType) -> Self {
        self.selection_type = selection_type;
        self
    }

    pub fn selected_row_keys(mut self, keys: Vec<Key>) -> Self {
        self.selected_row_keys = Some(keys);
        self
    }

    pub fn default_selected_row_keys(mut self, keys: Vec<Key>) -> Self {
        self.default_selected_row_keys = keys;
        self
    }

    pub fn preserve_selected_row_keys(mut self, preserve: bool) -> Self {
        self.preserve_selected_row_keys = preserve;
        self
    }

    pub fn check_strictly(mut self, strict: bool) -> Self {
        self.check_strictly = strict;
        self
    }

    pub fn checkbox_props<F>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> CheckboxProps + Send + Sync + 'static,
    {
        self.checkbox_props = Some(Arc::new(f));
        self
    }

    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Key], &[R], SelectionInfo) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn on_select<F>(mut self, f: F) -> Self
    where
        F: Fn(&R, bool, &[R], Modifiers) + Send + Sync + 'static,
    {
        self.on_select = Some(Arc::new(f));
        self
    }

    pub fn on_select_none<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_select_none = Some(Arc::new(f));
        self
    }

    pub fn selections(mut self, selections: Selections) -> Self {
        self.selections = selections;
        self
    }

    pub fn hide_select_all(mut self, hide: bool) -> Self {
        self.hide_select_all = hide;
        self
    }

    pub fn fixed(mut self, fixed: Fixed) -> Self {
        self.fixed = Some(fixed);
        self
    }

    pub fn column_width(mut self, width: u32) -> Self {
        self.column_width = Some(width);
        self
    }

    pub fn column_title(mut self, title: impl Into<String>) -> Self {
        self.column_title = Some(title.into());
        self
    }

    pub fn render_cell<F>(mut self, f: F) -> Self
    where
        F: Fn(SelectionCell, &R, usize) -> SelectionCell + Send + Sync + 'static,
    {
        self.render_cell = Some(Arc::new(f));
        self
    }
}

impl<R> fmt::Debug for RowSelection<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSelection")
            .field("selection_type", &self.selection_type)
            .field("selected_row_keys", &self.selected_row_keys)
            .field("default_selected_row_keys", &self.default_selected_row_keys)
            .field("preserve_selected_row_keys", &self.preserve_selected_row_keys)
            .field("check_strictly", &self.check_strictly)
            .field("selections", &self.selections)
            .field("hide_select_all", &self.hide_select_all)
            .field("fixed", &self.fixed)
            .finish()
    }
}
