//! Pagination: merges configured and internal page state and slices rows.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Pagination settings.
///
/// `current` and `page_size` are controlled values; when set they win over
/// internal state. Loadable from JSON:
///
/// ```
/// use gridstate::PaginationConfig;
///
/// let config: PaginationConfig = serde_json::from_str(r#"{"default_page_size": 25}"#).unwrap();
/// assert_eq!(config.default_page_size, 25);
/// assert_eq!(config.default_current, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub current: Option<usize>,
    pub default_current: usize,
    pub page_size: Option<usize>,
    pub default_page_size: usize,
    /// Total row count for data paginated elsewhere. Zero or `None` means
    /// the count of rows after filtering.
    pub total: Option<usize>,
    /// Turn pagination off: every row is on one page.
    pub disabled: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            current: None,
            default_current: 1,
            page_size: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            total: None,
            disabled: false,
        }
    }
}

impl PaginationConfig {
    /// Pagination turned off.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Default::default()
        }
    }

    pub fn current(mut self, current: usize) -> Self {
        self.current = Some(current);
        self
    }

    pub fn default_current(mut self, current: usize) -> Self {
        self.default_current = current;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn default_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

/// Effective page state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    /// 1-based page number.
    pub current: usize,
    pub page_size: usize,
    pub total: usize,
}

impl PaginationState {
    /// Number of pages, at least 1.
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(self.page_size).max(1)
    }
}

/// Called with `(current, page_size)` when the page changes.
pub type PaginationChangeFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Owns the page state of one table.
pub struct PaginationCoordinator {
    config: PaginationConfig,
    current: usize,
    page_size: usize,
    on_change: Option<PaginationChangeFn>,
}

impl PaginationCoordinator {
    pub fn new(config: PaginationConfig) -> Self {
        Self {
            current: config.default_current.max(1),
            page_size: config.default_page_size.max(1),
            config,
            on_change: None,
        }
    }

    /// Register the page-change callback.
    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub(crate) fn set_on_change(&mut self, f: Option<PaginationChangeFn>) {
        self.on_change = f;
    }

    /// Replace the settings. Internal page state is kept.
    pub fn set_config(&mut self, config: PaginationConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.disabled
    }

    /// Effective page state for `data_len` rows, `None` when disabled.
    ///
    /// The page is clamped to the last page; an empty table reports page 1.
    pub fn merged(&self, data_len: usize) -> Option<PaginationState> {
        if self.config.disabled {
            return None;
        }

        let total = match self.config.total {
            Some(total) if total > 0 => total,
            _ => data_len,
        };
        let page_size = self.config.page_size.unwrap_or(self.page_size).max(1);
        let current = self.config.current.unwrap_or(self.current).max(1);

        let max_page = total.div_ceil(page_size);
        let current = if current > max_page { max_page.max(1) } else { current };

        Some(PaginationState {
            current,
            page_size,
            total,
        })
    }

    /// Rows of the current page.
    ///
    /// When fewer rows are present than the configured total, the rows are
    /// assumed to be the current page already; they are only sliced when
    /// they overflow one page.
    pub fn page_rows<R: Clone>(&self, rows: &[R]) -> Vec<R> {
        let Some(state) = self.merged(rows.len()) else {
            return rows.to_vec();
        };

        if rows.len() < state.total {
            if rows.len() <= state.page_size {
                return rows.to_vec();
            }
            warn!(
                "{} rows supplied for a total of {}, slicing locally",
                rows.len(),
                state.total
            );
        }

        let start = (state.current - 1) * state.page_size;
        let end = (start + state.page_size).min(rows.len());
        rows.get(start..end).map(<[R]>::to_vec).unwrap_or_default()
    }

    /// Navigate to a page. Fires the page-change callback.
    pub fn change(&mut self, current: usize, page_size: usize) {
        let page_size = if page_size == 0 { self.page_size } else { page_size };
        self.current = current.max(1);
        self.page_size = page_size;
        debug!("Page changed to {} (size {})", self.current, self.page_size);
        if let Some(on_change) = &self.on_change {
            on_change(self.current, self.page_size);
        }
    }

    /// Return to page 1 after a sort or filter commit, keeping the page
    /// size. Fires the page-change callback once with page 1; does nothing
    /// when pagination is disabled.
    pub fn reset(&mut self) {
        if self.config.disabled {
            return;
        }
        let page_size = self.config.page_size.unwrap_or(self.page_size).max(1);
        self.current = 1;
        self.page_size = page_size;
        debug!("Page reset to 1");
        if let Some(on_change) = &self.on_change {
            on_change(1, page_size);
        }
    }
}

impl Default for PaginationCoordinator {
    fn default() -> Self {
        Self::new(PaginationConfig::default())
    }
}

impl fmt::Debug for PaginationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationCoordinator")
            .field("config", &self.config)
            .field("current", &self.current)
            .field("page_size", &self.page_size)
            .finish()
    }
}
