//! Locale strings used by the engines.

use serde::{Deserialize, Serialize};

/// Named strings for menu items, tooltips, and filter dropdowns.
///
/// Missing fields fall back to English when deserialized, so a host can
/// load a partial table:
///
/// ```
/// use gridstate::TableLocale;
///
/// let locale: TableLocale = serde_json::from_str(r#"{"filter_confirm": "Valider"}"#).unwrap();
/// assert_eq!(locale.filter_confirm, "Valider");
/// assert_eq!(locale.filter_reset, "Reset");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLocale {
    pub filter_title: String,
    pub filter_confirm: String,
    pub filter_reset: String,
    pub filter_empty_text: String,
    pub filter_checkall: String,
    pub filter_search_placeholder: String,
    pub empty_text: String,
    pub select_all: String,
    pub select_invert: String,
    pub select_none: String,
    pub selection_all: String,
    pub sort_title: String,
    pub expand: String,
    pub collapse: String,
    pub trigger_desc: String,
    pub trigger_asc: String,
    pub cancel_sort: String,
}

impl Default for TableLocale {
    fn default() -> Self {
        Self {
            filter_title: "Filter menu".into(),
            filter_confirm: "OK".into(),
            filter_reset: "Reset".into(),
            filter_empty_text: "No filters".into(),
            filter_checkall: "Select all items".into(),
            filter_search_placeholder: "Search in filters".into(),
            empty_text: "No data".into(),
            select_all: "Select current page".into(),
            select_invert: "Invert current page".into(),
            select_none: "Clear all data".into(),
            selection_all: "Select all data".into(),
            sort_title: "Sort".into(),
            expand: "Expand row".into(),
            collapse: "Collapse row".into(),
            trigger_desc: "Click to sort descending".into(),
            trigger_asc: "Click to sort ascending".into(),
            cancel_sort: "Click to cancel sorting".into(),
        }
    }
}
