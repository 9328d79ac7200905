//! Search input debouncing.
//!
//! # Design
//! - Pure state machine: callers feed keystrokes and poll with their own clock.
//! - A zero delay settles every input immediately.

use std::time::{Duration, Instant};

use reviewdesk_config::FilterSettings;

/// Holds back a typed search term until input has been quiet for `delay`.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
    settled: String,
}

impl SearchDebouncer {
    /// Build a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            settled: String::new(),
        }
    }

    /// Build a debouncer from the filter settings.
    #[must_use]
    pub const fn from_settings(settings: &FilterSettings) -> Self {
        Self::new(settings.search_debounce)
    }

    /// Record a keystroke; restarts the quiet period.
    pub fn input(&mut self, term: impl Into<String>, now: Instant) {
        self.pending = Some((term.into(), now));
    }

    /// Instant at which the pending term settles, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.delay)
    }

    /// Return the newly settled term once the quiet period has elapsed.
    ///
    /// Yields `None` while waiting, and when the settled term did not change.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        self.settle()
    }

    /// Settle the pending term immediately (for example on Enter).
    pub fn flush(&mut self) -> Option<String> {
        self.settle()
    }

    /// Last settled term.
    #[must_use]
    pub fn settled(&self) -> &str {
        &self.settled
    }

    fn settle(&mut self) -> Option<String> {
        let (term, _) = self.pending.take()?;
        if term == self.settled {
            return None;
        }
        self.settled.clone_from(&term);
        Some(term)
    }
}
