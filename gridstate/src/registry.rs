//! Key registry: row lookup by key across a row tree.

use std::collections::HashMap;

use log::warn;

use crate::error::{Result, TableError};
use crate::key::{Key, RowKeyFn};
use crate::record::TableRecord;

/// Visit every row depth-first in pre-order.
///
/// The callback receives the row, its index among its siblings, and its depth.
pub(crate) fn walk_rows<'a, R, F>(rows: &'a [R], children_column: &str, f: &mut F)
where
    R: TableRecord,
    F: FnMut(&'a R, usize, usize),
{
    fn inner<'a, R, F>(rows: &'a [R], children_column: &str, depth: usize, f: &mut F)
    where
        R: TableRecord,
        F: FnMut(&'a R, usize, usize),
    {
        for (index, row) in rows.iter().enumerate() {
            f(row, index, depth);
            if let Some(children) = row.children(children_column) {
                inner(children, children_column, depth + 1, f);
            }
        }
    }

    inner(rows, children_column, 0, f);
}

/// Flatten a row tree into a pre-order list (parents before children).
pub fn flatten<'a, R: TableRecord>(rows: &'a [R], children_column: &str) -> Vec<&'a R> {
    let mut list = Vec::new();
    walk_rows(rows, children_column, &mut |row, _, _| list.push(row));
    list
}

/// Build a key-to-row map over a row tree.
///
/// Later duplicate keys overwrite earlier ones. Rows without a key are
/// skipped with a warning.
pub fn build_index<R: TableRecord>(
    rows: &[R],
    children_column: &str,
    row_key: &RowKeyFn<R>,
) -> HashMap<Key, R> {
    KeyRegistry::build_lenient(rows, children_column, row_key).records
}

/// Lookup from row key to row, covering nested children.
#[derive(Debug, Clone)]
pub struct KeyRegistry<R> {
    records: HashMap<Key, R>,
    /// Keys in pre-order of first appearance.
    order: Vec<Key>,
}

impl<R> Default for KeyRegistry<R> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<R: TableRecord> KeyRegistry<R> {
    /// Build the registry, failing on the first row without a key.
    pub fn build(rows: &[R], children_column: &str, row_key: &RowKeyFn<R>) -> Result<Self> {
        let mut registry = Self::default();
        let mut missing = None;

        walk_rows(rows, children_column, &mut |row, index, depth| {
            if missing.is_some() {
                return;
            }
            match row_key(row, index) {
                Some(key) => registry.insert(key, row),
                None => missing = Some(TableError::MissingRowKey { index, depth }),
            }
        });

        match missing {
            Some(err) => Err(err),
            None => Ok(registry),
        }
    }

    /// Build the registry, skipping rows without a key.
    pub fn build_lenient(rows: &[R], children_column: &str, row_key: &RowKeyFn<R>) -> Self {
        let mut registry = Self::default();

        walk_rows(rows, children_column, &mut |row, index, depth| {
            match row_key(row, index) {
                Some(key) => registry.insert(key, row),
                None => warn!("Row {} at depth {} has no row key, skipping", index, depth),
            }
        });

        registry
    }

    fn insert(&mut self, key: Key, row: &R) {
        if self.records.insert(key.clone(), row.clone()).is_none() {
            self.order.push(key);
        }
    }

    /// Get the row for a key.
    pub fn get(&self, key: &Key) -> Option<&R> {
        self.records.get(key)
    }

    /// Check whether a key is registered.
    pub fn contains(&self, key: &Key) -> bool {
        self.records.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All keys in depth-first pre-order.
    pub fn keys(&self) -> &[Key] {
        &self.order
    }
}
