//! Row records.

use std::collections::BTreeMap;

use crate::value::Value;

/// Default name of the column holding nested child rows.
pub const DEFAULT_CHILDREN_COLUMN: &str = "children";

/// Trait for rows that can be managed by a table.
///
/// The engines never inspect a row beyond this trait: identity comes from
/// the table's row-key function, nesting from [`children`](TableRecord::children),
/// and field-based sorters read [`field`](TableRecord::field).
///
/// # Example
///
/// ```
/// use gridstate::{TableRecord, Value};
///
/// #[derive(Clone)]
/// struct Folder {
///     name: Value,
///     subfolders: Vec<Folder>,
/// }
///
/// impl TableRecord for Folder {
///     fn children(&self, column: &str) -> Option<&[Self]> {
///         (column == "children" && !self.subfolders.is_empty()).then_some(&self.subfolders[..])
///     }
///
///     fn field(&self, name: &str) -> Option<&Value> {
///         (name == "name").then_some(&self.name)
///     }
///
///     fn with_children(&self, _column: &str, children: Vec<Self>) -> Self {
///         Folder { name: self.name.clone(), subfolders: children }
///     }
/// }
/// ```
pub trait TableRecord: Clone + Send + Sync + 'static {
    /// Nested child rows stored under `column`, if any.
    fn children(&self, column: &str) -> Option<&[Self]>;

    /// Read a named field.
    fn field(&self, name: &str) -> Option<&Value> {
        let _ = name;
        None
    }

    /// Copy of this row with its children under `column` replaced.
    ///
    /// Sorting and filtering rebuild tree levels through this instead of
    /// mutating input rows.
    fn with_children(&self, column: &str, children: Vec<Self>) -> Self;
}

/// A dynamic row with named fields and named child lists.
///
/// # Example
///
/// ```
/// use gridstate::Record;
///
/// let row = Record::new()
///     .set("key", 1)
///     .set("name", "Ada")
///     .child_rows("children", vec![Record::new().set("key", 2)]);
///
/// assert_eq!(row.get("name").and_then(|v| v.as_str()), Some("Ada"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: BTreeMap<String, Value>,
    children: BTreeMap<String, Vec<Record>>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value (builder style).
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets the child rows stored under `column` (builder style).
    pub fn child_rows(mut self, column: impl Into<String>, rows: Vec<Record>) -> Self {
        self.children.insert(column.into(), rows);
        self
    }

    /// Gets a field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Inserts or replaces a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Iterates over field names and values in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a record tree from a JSON object.
    ///
    /// An array stored under `children_column` becomes the child rows; every
    /// other member becomes a field. Non-object input yields an empty record.
    pub fn from_json(json: &serde_json::Value, children_column: &str) -> Self {
        let mut record = Record::new();
        let Some(object) = json.as_object() else {
            return record;
        };

        for (name, value) in object {
            match value {
                serde_json::Value::Array(items) if name == children_column => {
                    let rows = items
                        .iter()
                        .map(|item| Record::from_json(item, children_column))
                        .collect();
                    record.children.insert(name.clone(), rows);
                }
                other => {
                    record.fields.insert(name.clone(), Value::from(other));
                }
            }
        }

        record
    }

    /// Builds a list of records from a JSON array.
    pub fn list_from_json(json: &serde_json::Value, children_column: &str) -> Vec<Self> {
        json.as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|item| Record::from_json(item, children_column))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TableRecord for Record {
    fn children(&self, column: &str) -> Option<&[Self]> {
        self.children.get(column).map(Vec::as_slice)
    }

    fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    fn with_children(&self, column: &str, children: Vec<Self>) -> Self {
        let mut copy = self.clone();
        copy.children.insert(column.to_string(), children);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_nested() {
        let json = serde_json::json!({
            "key": "a",
            "age": 3,
            "children": [{"key": "a1"}, {"key": "a2", "children": [{"key": "a2x"}]}]
        });
        let record = Record::from_json(&json, "children");

        assert_eq!(record.get("key"), Some(&Value::from("a")));
        assert_eq!(record.get("age"), Some(&Value::from(3)));
        assert!(record.get("children").is_none());

        let children = record.children("children").unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].children("children").unwrap().len(), 1);
    }

    #[test]
    fn test_from_json_custom_children_column() {
        let json = serde_json::json!({"key": 1, "items": [{"key": 2}]});
        let record = Record::from_json(&json, "items");
        assert!(record.children("children").is_none());
        assert_eq!(record.children("items").unwrap().len(), 1);
    }

    #[test]
    fn test_with_children_leaves_original_untouched() {
        let original = Record::new()
            .set("key", 1)
            .child_rows("children", vec![Record::new().set("key", 2)]);
        let replaced = original.with_children("children", vec![]);

        assert_eq!(original.children("children").unwrap().len(), 1);
        assert!(replaced.children("children").unwrap().is_empty());
    }

    #[test]
    fn test_list_from_json() {
        let json = serde_json::json!([{"key": 1}, {"key": 2}]);
        assert_eq!(Record::list_from_json(&json, "children").len(), 2);
        assert!(Record::list_from_json(&serde_json::json!({}), "children").is_empty());
    }
}
