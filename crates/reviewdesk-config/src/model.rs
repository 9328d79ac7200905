//! Typed client settings.

use std::time::Duration;

use crate::defaults::{
    DEFAULT_BULK_CONCURRENCY, DEFAULT_LOG_LEVEL, DEFAULT_PAGE_SIZE,
    DEFAULT_RATE_LIMIT_COOLDOWN_MS, DEFAULT_SEARCH_DEBOUNCE_MS,
};

/// Complete client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeskConfig {
    /// Bulk reply tunables.
    pub bulk: BulkReplySettings,
    /// List filter tunables.
    pub filters: FilterSettings,
    /// Logging preferences.
    pub logging: LogSettings,
}

/// Tunables for the bulk reply worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkReplySettings {
    /// Maximum reply submissions in flight at once.
    pub concurrency: usize,
    /// Pause applied by a worker after the backend reports rate limiting.
    pub cooldown: Duration,
}

impl Default for BulkReplySettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_BULK_CONCURRENCY,
            cooldown: Duration::from_millis(DEFAULT_RATE_LIMIT_COOLDOWN_MS),
        }
    }
}

/// Tunables for the review list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSettings {
    /// Quiet period before a typed search term takes effect.
    pub search_debounce: Duration,
    /// Reviews requested per page.
    pub per_page: u32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Requested log output format; `None` in [`LogSettings`] lets the build decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level directive passed to the env filter.
    pub level: String,
    /// Explicit output format.
    pub format: Option<LogOutput>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: None,
        }
    }
}
