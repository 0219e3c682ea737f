//! Selection engine: owns the selected keys of one table.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexSet;
use log::{debug, trace, warn};

use super::column::{SelectAllHeader, SelectionCell, SelectionColumn, SelectionMenuItem, place_selection_column};
use super::config::{CheckboxProps, RowSelection, SelectionItem, SelectionType};
use crate::column::ColumnDescriptor;
use crate::events::{Modifiers, RowSelectMethod, SelectionInfo};
use crate::key::{Key, RowKeyFn};
use crate::locale::TableLocale;
use crate::record::TableRecord;
use crate::registry::{KeyRegistry, walk_rows};
use crate::tree::{CheckedState, KeyEntities, conduct_check};

/// Selection state machine of one table.
///
/// Inputs arrive through [`sync`](Self::sync): the filtered data, the rows
/// of the current page, and a registry of every row. Interactions compute
/// the next key set, notify the host, and (unless the keys are controlled)
/// store it.
pub struct SelectionEngine<R> {
    config: RowSelection<R>,
    row_key: RowKeyFn<R>,
    children_column: String,

    /// Uncontrolled selection.
    inner_keys: Vec<Key>,
    /// Rows of selected keys, kept across data changes in preserve mode.
    preserved: HashMap<Key, R>,
    last_selected: Option<Key>,

    registry: Arc<KeyRegistry<R>>,
    /// Built from the data when checks are conducted.
    entities: Option<KeyEntities>,
    /// Top-level keys of the filtered data.
    data_keys: Vec<Key>,
    /// Top-level keys of the current page.
    page_keys: Vec<Key>,
    /// Every key of the current page, parents before children.
    flat_page_keys: Vec<Key>,
    checkbox_props: HashMap<Key, CheckboxProps>,
}

impl<R: TableRecord> SelectionEngine<R> {
    pub fn new(config: RowSelection<R>, row_key: RowKeyFn<R>, children_column: impl Into<String>) -> Self {
        Self {
            inner_keys: config.default_selected_row_keys.clone(),
            config,
            row_key,
            children_column: children_column.into(),
            preserved: HashMap::new(),
            last_selected: None,
            registry: Arc::new(KeyRegistry::default()),
            entities: None,
            data_keys: Vec::new(),
            page_keys: Vec::new(),
            flat_page_keys: Vec::new(),
            checkbox_props: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RowSelection<R> {
        &self.config
    }

    /// Replace the settings. Uncontrolled keys are kept; call
    /// [`sync`](Self::sync) afterwards to re-derive.
    pub fn set_config(&mut self, config: RowSelection<R>) {
        self.config = config;
    }

    /// Update the controlled keys. `None` hands control back to the engine.
    pub fn set_controlled_keys(&mut self, keys: Option<Vec<Key>>) {
        self.config.selected_row_keys = keys;
        self.update_preserved(&self.merged_keys());
    }

    /// Drop every uncontrolled key.
    pub fn clear_inner(&mut self) {
        self.inner_keys.clear();
        self.preserved.clear();
        self.last_selected = None;
    }

    /// Re-derive from new data.
    ///
    /// `data` is every row after sorting and filtering, `page_data` the rows
    /// of the current page, and `registry` covers every row of the table.
    pub fn sync(&mut self, data: &[R], page_data: &[R], registry: Arc<KeyRegistry<R>>) {
        self.registry = registry;
        self.entities = if self.config.check_strictly {
            None
        } else {
            Some(KeyEntities::from_rows(data, &self.children_column, &self.row_key))
        };

        self.data_keys = self.top_level_keys(data);
        self.page_keys = self.top_level_keys(page_data);

        let mut flat_page_keys = Vec::new();
        let mut checkbox_props = HashMap::new();
        walk_rows(page_data, &self.children_column, &mut |row, index, _| {
            let Some(key) = (self.row_key)(row, index) else {
                return;
            };
            let props = self
                .config
                .checkbox_props
                .as_ref()
                .map(|f| f(row))
                .unwrap_or_default();
            checkbox_props.insert(key.clone(), props);
            flat_page_keys.push(key);
        });
        self.flat_page_keys = flat_page_keys;
        self.checkbox_props = checkbox_props;

        self.update_preserved(&self.merged_keys());
        trace!(
            "Selection synced: {} data rows, {} page rows",
            self.data_keys.len(),
            self.flat_page_keys.len()
        );
    }

    fn top_level_keys(&self, rows: &[R]) -> Vec<Key> {
        rows.iter()
            .enumerate()
            .filter_map(|(index, row)| (self.row_key)(row, index))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Derived state
    // -------------------------------------------------------------------------

    /// Controlled keys if present, else internal keys.
    fn merged_keys(&self) -> Vec<Key> {
        self.config
            .selected_row_keys
            .clone()
            .unwrap_or_else(|| self.inner_keys.clone())
    }

    fn is_disabled(&self, key: &Key) -> bool {
        self.checkbox_props.get(key).is_some_and(|p| p.disabled)
    }

    /// Checked and half-checked keys after conduction.
    fn derived(&self) -> (Vec<Key>, Vec<Key>) {
        let keys = self.merged_keys();
        let (checked, half) = match &self.entities {
            None => (keys, Vec::new()),
            Some(entities) => {
                let result = conduct_check(&keys, &CheckedState::Checked, entities, |k| self.is_disabled(k));
                (result.checked_keys, result.half_checked_keys)
            }
        };

        match self.config.selection_type {
            SelectionType::Radio => (checked.into_iter().take(1).collect(), Vec::new()),
            SelectionType::Checkbox => (checked, half),
        }
    }

    /// Keys shown as selected.
    pub fn selected_keys(&self) -> IndexSet<Key> {
        self.derived().0.into_iter().collect()
    }

    /// Keys shown as half-selected.
    pub fn half_selected_keys(&self) -> IndexSet<Key> {
        self.derived().1.into_iter().collect()
    }

    pub fn is_selected(&self, key: &Key) -> bool {
        self.derived().0.contains(key)
    }

    /// Enabled keys of the current page, parents before children.
    pub fn page_record_keys(&self) -> Vec<Key> {
        self.flat_page_keys
            .iter()
            .filter(|k| !self.is_disabled(k))
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------------
    // Committing
    // -------------------------------------------------------------------------

    fn update_preserved(&mut self, keys: &[Key]) {
        if !self.config.preserve_selected_row_keys {
            return;
        }
        let mut cache = HashMap::with_capacity(keys.len());
        for key in keys {
            let record = self
                .registry
                .get(key)
                .cloned()
                .or_else(|| self.preserved.get(key).cloned());
            if let Some(record) = record {
                cache.insert(key.clone(), record);
            }
        }
        self.preserved = cache;
    }

    fn record_of(&self, key: &Key) -> Option<R> {
        self.registry
            .get(key)
            .cloned()
            .or_else(|| self.preserved.get(key).cloned())
    }

    fn records_of(&self, keys: &[Key]) -> Vec<R> {
        keys.iter().filter_map(|k| self.record_of(k)).collect()
    }

    /// Commit a key set and notify the host.
    fn set_selected_keys(&mut self, mut keys: Vec<Key>, method: RowSelectMethod) {
        if self.config.selection_type == SelectionType::Radio {
            keys.truncate(1);
        }
        self.update_preserved(&keys);

        let mut records = Vec::with_capacity(keys.len());
        let mut stale = Vec::new();
        for key in &keys {
            match self.record_of(key) {
                Some(record) => records.push(record),
                None => stale.push(key.clone()),
            }
        }
        if !stale.is_empty() && !self.config.preserve_selected_row_keys {
            warn!("Selected keys {:?} have no rows, omitted from selected rows", stale);
        }

        debug!("Selection changed ({:?}): {} key(s)", method, keys.len());
        if self.config.selected_row_keys.is_none() {
            self.inner_keys = keys.clone();
        }
        if let Some(on_change) = &self.config.on_change {
            on_change(&keys, &records, SelectionInfo { method });
        }
    }

    fn trigger_single(&mut self, key: &Key, selected: bool, keys: Vec<Key>, modifiers: Modifiers) {
        if let Some(on_select) = self.config.on_select.clone() {
            if let Some(record) = self.record_of(key) {
                let rows = self.records_of(&keys);
                on_select(&record, selected, &rows, modifiers);
            }
        }
        self.set_selected_keys(keys, RowSelectMethod::Single);
    }

    fn knows(&self, key: &Key) -> bool {
        self.registry.contains(key) || self.config.preserve_selected_row_keys
    }

    /// Bulk and range actions select several rows and do not apply to radios.
    fn rejects_bulk(&self, action: &str) -> bool {
        let radio = self.config.selection_type == SelectionType::Radio;
        if radio {
            debug!("{} ignored in radio mode", action);
        }
        radio
    }

    // -------------------------------------------------------------------------
    // Interactions
    // -------------------------------------------------------------------------

    /// Set one row's selection.
    ///
    /// With conduction on, descendants and ancestors follow. Unknown keys
    /// are ignored unless selected keys are preserved.
    pub fn toggle_single(&mut self, key: &Key, selected: bool, modifiers: Modifiers) {
        if !self.knows(key) {
            debug!("Toggle of unknown key {} ignored", key);
            return;
        }
        if self.config.selection_type == SelectionType::Radio {
            if selected {
                self.select_radio(key);
            }
            return;
        }

        let (current, _) = self.derived();
        let keys = match &self.entities {
            None => {
                let mut keys = current;
                if selected {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                } else {
                    keys.retain(|k| k != key);
                }
                keys
            }
            Some(entities) => {
                let mut fill = current;
                if !fill.contains(key) {
                    fill.push(key.clone());
                }
                let filled = conduct_check(&fill, &CheckedState::Checked, entities, |k| self.is_disabled(k));
                if selected {
                    filled.checked_keys
                } else {
                    let remaining: Vec<Key> = filled.checked_keys.into_iter().filter(|k| k != key).collect();
                    let state = CheckedState::Unchecked {
                        half_checked_keys: filled.half_checked_keys,
                    };
                    conduct_check(&remaining, &state, entities, |k| self.is_disabled(k)).checked_keys
                }
            }
        };

        self.trigger_single(key, selected, keys, modifiers);
        self.last_selected = selected.then(|| key.clone());
    }

    /// Select one row in radio mode. Selecting the selected row does nothing.
    pub fn select_radio(&mut self, key: &Key) {
        if !self.knows(key) || self.is_selected(key) {
            return;
        }
        self.trigger_single(key, true, vec![key.clone()], Modifiers::NONE);
        self.last_selected = Some(key.clone());
    }

    /// Apply `selected` to every enabled page row between `anchor` and
    /// `target`, inclusive, leaving rows outside the span untouched.
    ///
    /// Radio selection ignores ranges. Range selection only applies when
    /// checks are not conducted; otherwise, or when either end is not on
    /// the page, this is a single toggle of `target`.
    pub fn toggle_range(&mut self, anchor: &Key, target: &Key, selected: bool) {
        if self.rejects_bulk("Range selection") {
            return;
        }
        if !self.config.check_strictly {
            warn!("Range selection is unavailable while checks are conducted, toggling {} only", target);
            self.toggle_single(target, selected, Modifiers::shift());
            return;
        }

        let record_keys = self.page_record_keys();
        let start = record_keys.iter().position(|k| k == anchor);
        let end = record_keys.iter().position(|k| k == target);
        let (start, end) = match (start, end) {
            (Some(a), Some(b)) if a != b => (a.min(b), a.max(b)),
            _ => {
                self.toggle_single(target, selected, Modifiers::shift());
                return;
            }
        };

        let mut keys: IndexSet<Key> = self.selected_keys();
        for key in &record_keys[start..=end] {
            if selected {
                keys.insert(key.clone());
            } else {
                keys.shift_remove(key);
            }
        }

        self.set_selected_keys(keys.into_iter().collect(), RowSelectMethod::Multiple);
        self.last_selected = selected.then(|| target.clone());
    }

    /// A click on a row's checkbox. Shift extends from the last selected row.
    pub fn on_cell_change(&mut self, key: &Key, modifiers: Modifiers) {
        if self.config.selection_type == SelectionType::Radio {
            self.select_radio(key);
            return;
        }

        let checked = self.is_selected(key);
        let anchor = if modifiers.shift && self.config.check_strictly {
            self.last_selected.clone()
        } else {
            None
        };
        match anchor {
            Some(anchor) => self.toggle_range(&anchor, key, !checked),
            None => self.toggle_single(key, !checked, modifiers),
        }
        self.last_selected = (!checked).then(|| key.clone());
    }

    /// Select or clear every enabled row of the current page.
    pub fn toggle_all_on_page(&mut self, selected: bool) {
        if self.rejects_bulk("Page selection") {
            return;
        }
        let mut keys = self.selected_keys();
        for key in self.page_record_keys() {
            if selected {
                keys.insert(key);
            } else {
                keys.shift_remove(&key);
            }
        }
        self.set_selected_keys(keys.into_iter().collect(), RowSelectMethod::All);
        self.last_selected = None;
    }

    /// A click on the select-all checkbox.
    pub fn on_select_all_click(&mut self) {
        let selected = self.selected_keys();
        let all = self.page_record_keys().iter().all(|k| selected.contains(k));
        self.toggle_all_on_page(!all);
    }

    /// Flip every enabled top-level row of the current page.
    pub fn invert_on_page(&mut self) {
        if self.rejects_bulk("Invert") {
            return;
        }
        let mut keys = self.selected_keys();
        for key in &self.page_keys {
            if self.is_disabled(key) {
                continue;
            }
            if !keys.shift_remove(key) {
                keys.insert(key.clone());
            }
        }
        self.set_selected_keys(keys.into_iter().collect(), RowSelectMethod::Invert);
    }

    /// Select every top-level row of the data that is enabled or already selected.
    pub fn select_all_data(&mut self) {
        if self.rejects_bulk("Select all data") {
            return;
        }
        let selected = self.selected_keys();
        let keys: Vec<Key> = self
            .data_keys
            .iter()
            .filter(|k| !self.is_disabled(k) || selected.contains(*k))
            .cloned()
            .collect();
        self.set_selected_keys(keys, RowSelectMethod::All);
    }

    /// Clear the selection except rows whose checkbox is disabled.
    pub fn clear_all_retaining_disabled(&mut self) {
        if let Some(on_select_none) = &self.config.on_select_none {
            on_select_none();
        }
        let keys: Vec<Key> = self
            .selected_keys()
            .into_iter()
            .filter(|k| self.is_disabled(k))
            .collect();
        self.set_selected_keys(keys, RowSelectMethod::None);
    }

    // -------------------------------------------------------------------------
    // Selection menu
    // -------------------------------------------------------------------------

    fn menu_enabled(&self) -> bool {
        !self.config.hide_select_all && self.config.selection_type == SelectionType::Checkbox
    }

    /// Entries of the selection menu.
    pub fn selection_items(&self, locale: &TableLocale) -> Vec<SelectionMenuItem> {
        if !self.menu_enabled() {
            return Vec::new();
        }
        self.config
            .selections
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                SelectionItem::All => SelectionMenuItem {
                    key: "all".into(),
                    label: locale.selection_all.clone(),
                },
                SelectionItem::Invert => SelectionMenuItem {
                    key: "invert".into(),
                    label: locale.select_invert.clone(),
                },
                SelectionItem::None => SelectionMenuItem {
                    key: "none".into(),
                    label: locale.select_none.clone(),
                },
                SelectionItem::Custom(custom) => SelectionMenuItem {
                    key: if custom.key.is_empty() {
                        index.to_string()
                    } else {
                        custom.key.clone()
                    },
                    label: custom.text.clone(),
                },
            })
            .collect()
    }

    /// Run a menu entry by key. Returns `false` for unknown entries.
    pub fn run_selection_item(&mut self, key: &str) -> bool {
        if !self.menu_enabled() {
            return false;
        }
        let items = self.config.selections.items();
        let found = items.iter().enumerate().find(|(index, item)| match item {
            SelectionItem::All => key == "all",
            SelectionItem::Invert => key == "invert",
            SelectionItem::None => key == "none",
            SelectionItem::Custom(custom) if custom.key.is_empty() => key == index.to_string(),
            SelectionItem::Custom(custom) => key == custom.key,
        });
        let Some((_, item)) = found else {
            return false;
        };

        match item {
            SelectionItem::All => self.select_all_data(),
            SelectionItem::Invert => self.invert_on_page(),
            SelectionItem::None => self.clear_all_retaining_disabled(),
            SelectionItem::Custom(custom) => {
                if let Some(on_select) = &custom.on_select {
                    on_select(&self.page_record_keys());
                }
            }
        }
        self.last_selected = None;
        true
    }

    // -------------------------------------------------------------------------
    // Column
    // -------------------------------------------------------------------------

    /// State of the select-all checkbox, `None` in radio mode or when hidden.
    pub fn header(&self, locale: &TableLocale) -> Option<SelectAllHeader> {
        if self.config.selection_type == SelectionType::Radio || self.config.hide_select_all {
            return None;
        }

        let selected = self.selected_keys();
        let record_keys = self.page_record_keys();
        let all = record_keys.iter().all(|k| selected.contains(k));
        let some = record_keys.iter().any(|k| selected.contains(k));

        let disabled_keys: Vec<&Key> = self.flat_page_keys.iter().filter(|k| self.is_disabled(k)).collect();
        let all_disabled = !disabled_keys.is_empty() && disabled_keys.len() == self.flat_page_keys.len();
        let disabled_all_checked = all_disabled && disabled_keys.iter().all(|k| selected.contains(*k));
        let disabled_some_checked = all_disabled && disabled_keys.iter().any(|k| selected.contains(*k));

        let (checked, indeterminate) = if all_disabled {
            (disabled_all_checked, !disabled_all_checked && disabled_some_checked)
        } else {
            (!self.flat_page_keys.is_empty() && all, !all && some)
        };

        Some(SelectAllHeader {
            checked,
            indeterminate,
            disabled: self.flat_page_keys.is_empty() || all_disabled,
            menu: self.selection_items(locale),
        })
    }

    /// Selection state of a row.
    pub fn cell(&self, record: &R, index: usize) -> SelectionCell {
        self.renderer()(record, index)
    }

    fn renderer(&self) -> impl Fn(&R, usize) -> SelectionCell + Send + Sync + 'static {
        let (checked, half) = self.derived();
        let checked: IndexSet<Key> = checked.into_iter().collect();
        let half: IndexSet<Key> = half.into_iter().collect();
        let props = self.checkbox_props.clone();
        let row_key = self.row_key.clone();
        let checkbox_props = self.config.checkbox_props.clone();
        let selection_type = self.config.selection_type;
        let decorate = self.config.render_cell.clone();

        move |record: &R, index: usize| {
            let key = row_key(record, index);
            let props = match key.as_ref().and_then(|k| props.get(k)) {
                Some(props) => props.clone(),
                None => checkbox_props.as_ref().map(|f| f(record)).unwrap_or_default(),
            };
            let is_checked = key.as_ref().is_some_and(|k| checked.contains(k));
            let is_half = key.as_ref().is_some_and(|k| half.contains(k));

            let cell = SelectionCell {
                key: key.clone(),
                selection_type,
                checked: is_checked,
                indeterminate: match selection_type {
                    SelectionType::Radio => false,
                    SelectionType::Checkbox => props.indeterminate.unwrap_or(is_half),
                },
                disabled: props.disabled || key.is_none(),
                name: props.name,
            };
            match &decorate {
                Some(decorate) => decorate(cell, record, index),
                None => cell,
            }
        }
    }

    /// Place the selection column in a column list.
    pub fn transform_columns(&self, columns: Vec<ColumnDescriptor<R>>, locale: &TableLocale) -> Vec<ColumnDescriptor<R>> {
        let column = SelectionColumn {
            fixed: self.config.fixed,
            width: self.config.column_width,
            title: self.config.column_title.clone(),
            header: self.header(locale),
            render: Arc::new(self.renderer()),
        };
        place_selection_column(columns, column)
    }
}
