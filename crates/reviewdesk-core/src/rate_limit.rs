//! Cooldown guard armed when the backend answers HTTP 429.
//!
//! # Design
//! - One cooldown window at a time; arming while a window is open changes nothing.
//! - A single tokio timer closes the window and notifies watchers. The flag
//!   also expires lazily so the guard stays correct without a runtime.
//! - Timestamps use `tokio::time::Instant` so paused-clock tests control expiry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reviewdesk_config::BulkReplySettings;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::ApiError;

/// Shared rate-limit state with a single expiry timer.
#[derive(Clone)]
pub struct RateLimitGuard {
    inner: Arc<GuardInner>,
}

struct GuardInner {
    cooldown: Duration,
    state: Mutex<GuardState>,
    disabled_tx: watch::Sender<bool>,
}

#[derive(Default)]
struct GuardState {
    disabled: bool,
    last_error_at: Option<Instant>,
    // Bumped per window so a stale timer cannot close a newer one.
    window: u64,
}

impl RateLimitGuard {
    /// Build a guard with the given cooldown.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        let (disabled_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(GuardInner {
                cooldown,
                state: Mutex::new(GuardState::default()),
                disabled_tx,
            }),
        }
    }

    /// Build a guard from the bulk reply settings.
    #[must_use]
    pub fn from_settings(settings: &BulkReplySettings) -> Self {
        Self::new(settings.cooldown)
    }

    /// Whether an error signals rate limiting.
    #[must_use]
    pub const fn is_rate_limited(error: &ApiError) -> bool {
        error.is_rate_limited()
    }

    /// Configured cooldown length.
    #[must_use]
    pub fn cooldown_time(&self) -> Duration {
        self.inner.cooldown
    }

    /// Arm the guard when `error` signals rate limiting.
    ///
    /// Returns `true` when a new cooldown window was opened.
    pub fn handle_error(&self, error: &ApiError) -> bool {
        Self::is_rate_limited(error) && self.arm()
    }

    /// Open a cooldown window unless one is already open.
    ///
    /// Returns `true` when a new window was opened.
    pub fn arm(&self) -> bool {
        let now = Instant::now();
        let window = {
            let mut state = self.lock_state();
            if self.window_open(&state, now) {
                return false;
            }
            state.disabled = true;
            state.last_error_at = Some(now);
            state.window = state.window.wrapping_add(1);
            state.window
        };
        self.inner.disabled_tx.send_replace(true);
        info!(
            cooldown_ms = duration_millis(self.inner.cooldown),
            "rate limited; pausing reply submission"
        );

        match Handle::try_current() {
            Ok(handle) => {
                let guard = self.clone();
                handle.spawn(async move {
                    tokio::time::sleep(guard.inner.cooldown).await;
                    guard.expire(window);
                });
            }
            Err(_) => {
                warn!("no tokio runtime available; cooldown will expire lazily");
            }
        }
        true
    }

    /// Whether the cooldown window is currently open.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        let state = self.lock_state();
        self.window_open(&state, Instant::now())
    }

    /// Time left in the open window, or zero.
    #[must_use]
    pub fn remaining_cooldown(&self) -> Duration {
        let state = self.lock_state();
        self.remaining_at(&state, Instant::now())
    }

    /// Watch the disabled flag; receives `true` on arm and `false` on expiry.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.disabled_tx.subscribe()
    }

    fn expire(&self, window: u64) {
        {
            let mut state = self.lock_state();
            if state.window != window || !state.disabled {
                return;
            }
            state.disabled = false;
        }
        self.inner.disabled_tx.send_replace(false);
        debug!("rate-limit cooldown elapsed");
    }

    fn window_open(&self, state: &GuardState, now: Instant) -> bool {
        state.disabled && !self.remaining_at(state, now).is_zero()
    }

    fn remaining_at(&self, state: &GuardState, now: Instant) -> Duration {
        match (state.disabled, state.last_error_at) {
            (true, Some(stamp)) => self
                .inner
                .cooldown
                .saturating_sub(now.saturating_duration_since(stamp)),
            _ => Duration::ZERO,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, GuardState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RateLimitGuard {
    fn default() -> Self {
        Self::from_settings(&BulkReplySettings::default())
    }
}

impl std::fmt::Debug for RateLimitGuard {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RateLimitGuard")
            .field("cooldown", &self.inner.cooldown)
            .field("disabled", &self.is_disabled())
            .finish()
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(30);

    #[test]
    fn only_429_counts_as_rate_limited() {
        assert!(RateLimitGuard::is_rate_limited(&ApiError::new("slow", 429)));
        assert!(!RateLimitGuard::is_rate_limited(&ApiError::new("boom", 500)));
        assert!(!RateLimitGuard::is_rate_limited(&ApiError::new("gone", 404)));
    }

    #[test]
    fn default_cooldown_is_thirty_seconds() {
        assert_eq!(RateLimitGuard::default().cooldown_time(), COOLDOWN);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_guard_reports_no_cooldown() {
        let guard = RateLimitGuard::new(COOLDOWN);
        assert!(!guard.is_disabled());
        assert_eq!(guard.remaining_cooldown(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_cooldown_tracks_elapsed_time() {
        let guard = RateLimitGuard::new(COOLDOWN);
        assert!(guard.arm());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(guard.is_disabled());
        assert_eq!(guard.remaining_cooldown(), Duration::from_secs(20));

        tokio::time::advance(Duration::from_secs(21)).await;
        tokio::task::yield_now().await;
        assert!(!guard.is_disabled());
        assert_eq!(guard.remaining_cooldown(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_an_open_window_keeps_the_original_stamp() {
        let guard = RateLimitGuard::new(COOLDOWN);
        assert!(guard.arm());
        tokio::time::advance(Duration::from_secs(5)).await;

        assert!(!guard.arm());
        assert!(!guard.handle_error(&ApiError::new("slow", 429)));
        assert_eq!(guard.remaining_cooldown(), Duration::from_secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_errors_do_not_arm() {
        let guard = RateLimitGuard::new(COOLDOWN);
        assert!(!guard.handle_error(&ApiError::new("boom", 503)));
        assert!(!guard.is_disabled());
    }

    #[tokio::test(start_paused = true)]
    async fn watchers_see_arm_and_expiry() -> anyhow::Result<()> {
        let guard = RateLimitGuard::new(COOLDOWN);
        let mut watcher = guard.subscribe();
        assert!(!*watcher.borrow());

        assert!(guard.handle_error(&ApiError::new("slow", 429)));
        watcher.changed().await?;
        assert!(*watcher.borrow_and_update());

        let started = Instant::now();
        watcher.changed().await?;
        assert!(!*watcher.borrow_and_update());
        assert!(started.elapsed() >= COOLDOWN);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn guard_can_be_rearmed_after_expiry() {
        let guard = RateLimitGuard::new(COOLDOWN);
        assert!(guard.arm());
        tokio::time::advance(COOLDOWN + Duration::from_secs(1)).await;
        tokio::task::yield_now().await;

        assert!(guard.arm());
        assert!(guard.is_disabled());
        assert_eq!(guard.remaining_cooldown(), COOLDOWN);
    }

    #[test]
    fn guard_expires_lazily_without_a_runtime() {
        let guard = RateLimitGuard::new(Duration::ZERO);
        assert!(guard.arm());
        assert!(!guard.is_disabled());
        assert_eq!(guard.remaining_cooldown(), Duration::ZERO);
    }
}
