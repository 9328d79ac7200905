//! Environment-backed configuration loading.
//!
//! # Design
//! - Read every key through a lookup function so tests never touch the process environment.
//! - Unset keys fall back to the defaults in `defaults.rs`; set keys must validate.

use std::time::Duration;

use crate::defaults::{
    ENV_BULK_CONCURRENCY, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_PAGE_SIZE,
    ENV_RATE_LIMIT_COOLDOWN_MS, ENV_SEARCH_DEBOUNCE_MS, MAX_BULK_CONCURRENCY, MAX_PAGE_SIZE,
    MAX_RATE_LIMIT_COOLDOWN_MS, MAX_SEARCH_DEBOUNCE_MS,
};
use crate::error::ConfigResult;
use crate::model::DeskConfig;
use crate::validate::{ensure_range, parse_bounded, parse_log_level, parse_log_output};

impl DeskConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns a [`crate::ConfigError`] when a set variable fails to parse or validate.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns a [`crate::ConfigError`] when a present value fails to parse or validate.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_BULK_CONCURRENCY) {
            let value = parse_bounded(ENV_BULK_CONCURRENCY, &raw, 1, max_concurrency())?;
            config.bulk.concurrency = usize::try_from(value).unwrap_or(MAX_BULK_CONCURRENCY);
        }
        if let Some(raw) = lookup(ENV_RATE_LIMIT_COOLDOWN_MS) {
            let value =
                parse_bounded(ENV_RATE_LIMIT_COOLDOWN_MS, &raw, 0, MAX_RATE_LIMIT_COOLDOWN_MS)?;
            config.bulk.cooldown = Duration::from_millis(value);
        }
        if let Some(raw) = lookup(ENV_SEARCH_DEBOUNCE_MS) {
            let value = parse_bounded(ENV_SEARCH_DEBOUNCE_MS, &raw, 0, MAX_SEARCH_DEBOUNCE_MS)?;
            config.filters.search_debounce = Duration::from_millis(value);
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            let value = parse_bounded(ENV_PAGE_SIZE, &raw, 1, u64::from(MAX_PAGE_SIZE))?;
            config.filters.per_page = u32::try_from(value).unwrap_or(MAX_PAGE_SIZE);
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            config.logging.level = parse_log_level(ENV_LOG_LEVEL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.logging.format = Some(parse_log_output(ENV_LOG_FORMAT, &raw)?);
        }

        Ok(config)
    }

    /// Apply command-line overrides for the bulk reply tunables.
    ///
    /// # Errors
    /// Returns [`crate::ConfigError::OutOfRange`] when an override violates the same
    /// bounds enforced for environment values.
    pub fn with_bulk_overrides(
        mut self,
        concurrency: Option<usize>,
        cooldown_ms: Option<u64>,
    ) -> ConfigResult<Self> {
        if let Some(concurrency) = concurrency {
            let value = u64::try_from(concurrency).unwrap_or(u64::MAX);
            ensure_range(ENV_BULK_CONCURRENCY, value, 1, max_concurrency())?;
            self.bulk.concurrency = concurrency;
        }
        if let Some(cooldown_ms) = cooldown_ms {
            ensure_range(
                ENV_RATE_LIMIT_COOLDOWN_MS,
                cooldown_ms,
                0,
                MAX_RATE_LIMIT_COOLDOWN_MS,
            )?;
            self.bulk.cooldown = Duration::from_millis(cooldown_ms);
        }
        Ok(self)
    }
}

fn max_concurrency() -> u64 {
    u64::try_from(MAX_BULK_CONCURRENCY).unwrap_or(u64::MAX)
}
