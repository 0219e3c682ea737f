//! Error types

/// Configuration faults detected while setting up a table.
///
/// These are the only errors the engines surface. Everything that can go
/// wrong during interaction (stale keys, range clicks in conduction mode)
/// is logged and degraded instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The row-key function returned no key for a row.
    #[error("row {index} at depth {depth} has no row key")]
    MissingRowKey {
        /// Index of the row within its sibling list.
        index: usize,
        /// Tree depth of the row (0 = top level).
        depth: usize,
    },

    /// A selection column marker was placed inside a column group.
    ///
    /// Markers are only deduplicated among top-level columns, so a nested
    /// marker cannot be resolved unambiguously.
    #[error("selection column marker nested inside column group '{group}'")]
    NestedSelectionColumn {
        /// Key or title of the offending group.
        group: String,
    },
}

/// Result alias for table setup.
pub type Result<T> = std::result::Result<T, TableError>;
