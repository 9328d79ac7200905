//! Baseline values and environment keys for client configuration.
//!
//! # Design
//! - Keep every tunable's default and bounds next to each other.
//! - Environment keys share the `REVIEWDESK_` prefix.

/// Reply submissions allowed in flight during a bulk run.
pub const DEFAULT_BULK_CONCURRENCY: usize = 3;
/// Upper bound for bulk concurrency.
pub const MAX_BULK_CONCURRENCY: usize = 32;
/// Cooldown applied after the backend answers 429, in milliseconds.
pub const DEFAULT_RATE_LIMIT_COOLDOWN_MS: u64 = 30_000;
/// Upper bound for the rate-limit cooldown, in milliseconds.
pub const MAX_RATE_LIMIT_COOLDOWN_MS: u64 = 600_000;
/// Quiet period before a typed search term takes effect, in milliseconds.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
/// Upper bound for the search debounce, in milliseconds.
pub const MAX_SEARCH_DEBOUNCE_MS: u64 = 5_000;
/// Reviews requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound for the page size.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Log level used when neither the environment nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment key for [`DEFAULT_BULK_CONCURRENCY`].
pub const ENV_BULK_CONCURRENCY: &str = "REVIEWDESK_BULK_CONCURRENCY";
/// Environment key for [`DEFAULT_RATE_LIMIT_COOLDOWN_MS`].
pub const ENV_RATE_LIMIT_COOLDOWN_MS: &str = "REVIEWDESK_RATE_LIMIT_COOLDOWN_MS";
/// Environment key for [`DEFAULT_SEARCH_DEBOUNCE_MS`].
pub const ENV_SEARCH_DEBOUNCE_MS: &str = "REVIEWDESK_SEARCH_DEBOUNCE_MS";
/// Environment key for [`DEFAULT_PAGE_SIZE`].
pub const ENV_PAGE_SIZE: &str = "REVIEWDESK_PAGE_SIZE";
/// Environment key for the log level.
pub const ENV_LOG_LEVEL: &str = "REVIEWDESK_LOG_LEVEL";
/// Environment key for the log format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "REVIEWDESK_LOG_FORMAT";
