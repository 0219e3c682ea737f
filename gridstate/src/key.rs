//! Row identity.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::record::TableRecord;

/// Stable identity of a row.
///
/// Keys are never derived from structural equality. They come from the
/// table's row-key function, which may produce either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Numeric key.
    Num(i64),
    /// String key.
    Str(String),
}

impl Key {
    /// Returns the string form of the key, if it is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Num(_) => None,
        }
    }

    /// Returns the numeric form of the key, if it is a numeric key.
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Key::Num(n) => Some(*n),
            Key::Str(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Num(n) => write!(f, "{}", n),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Num(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Num(i64::from(n))
    }
}

/// Indices beyond `i64::MAX` fall back to their decimal text so distinct
/// indices keep distinct keys.
impl From<usize> for Key {
    fn from(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(n) => Key::Num(n),
            Err(_) => Key::Str(n.to_string()),
        }
    }
}

/// Derives the key of a row from the record and its index among its siblings.
///
/// Returning `None` is a configuration fault: at construction time it is
/// reported as [`TableError::MissingRowKey`](crate::TableError::MissingRowKey),
/// afterwards the row is skipped with a warning.
pub type RowKeyFn<R> = Arc<dyn Fn(&R, usize) -> Option<Key> + Send + Sync>;

/// Wrap a closure as a [`RowKeyFn`].
pub fn row_key_fn<R, F>(f: F) -> RowKeyFn<R>
where
    F: Fn(&R, usize) -> Option<Key> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Row-key function reading the key from a named field.
///
/// This is the default accessor, reading the `"key"` field.
pub fn row_key_by_field<R: TableRecord>(field: impl Into<String>) -> RowKeyFn<R> {
    let field = field.into();
    Arc::new(move |record: &R, _index| record.field(&field).and_then(|v| v.as_key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn test_key_display_and_conversions() {
        assert_eq!(Key::from(7).to_string(), "7");
        assert_eq!(Key::from("a1").to_string(), "a1");
        assert_eq!(Key::from(3usize), Key::Num(3));
        assert_eq!(Key::from("x").as_str(), Some("x"));
        assert_eq!(Key::from(5i64).as_num(), Some(5));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_huge_index_keeps_distinct_key() {
        assert_eq!(Key::from(i64::MAX as usize), Key::Num(i64::MAX));
        let beyond = Key::from(usize::MAX);
        assert_eq!(beyond, Key::Str(usize::MAX.to_string()));
        assert_ne!(beyond, Key::from(usize::MAX - 1));
    }

    #[test]
    fn test_key_serde_untagged() {
        let keys: Vec<Key> = serde_json::from_str(r#"[1, "two"]"#).unwrap();
        assert_eq!(keys, vec![Key::Num(1), Key::Str("two".into())]);
    }

    #[test]
    fn test_row_key_by_field() {
        let get_key = row_key_by_field::<Record>("id");
        let record = Record::new().set("id", 42i64);
        assert_eq!(get_key(&record, 0), Some(Key::Num(42)));

        let missing = Record::new().set("name", "no id");
        assert_eq!(get_key(&missing, 0), None);
    }
}
