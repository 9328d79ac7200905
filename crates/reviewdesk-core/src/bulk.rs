//! Bulk reply orchestration.
//!
//! # Design
//! - A fixed pool of `min(concurrency, N)` tokio tasks drains one shared FIFO
//!   queue; each dequeue is a single locked `pop_front`, so no review is
//!   submitted twice.
//! - Workers never touch progress directly. They send events over a channel
//!   to the aggregator running inside [`BulkReplyOrchestrator::run`], which
//!   owns the canonical [`BulkReplyProgress`] and calls the observer.
//! - Item failures are recorded and the run carries on. A rate-limited worker
//!   arms the shared guard and sleeps one cooldown before reporting the item;
//!   cancellation cuts that sleep short.
//! - Each submission runs in its own detached task. A panicking transport
//!   becomes an item failure, and dropping the `run` future lets submissions
//!   already in flight finish. Reviews still queued at that point are not
//!   attempted.

use std::collections::{HashSet, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use std::sync::{Arc, Mutex, PoisonError};

use reviewdesk_config::BulkReplySettings;
use reviewdesk_telemetry::{Metrics, ReplyOutcome};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::{ApiError, DEFAULT_ERROR_STATUS, ServiceResult};
use crate::rate_limit::RateLimitGuard;
use crate::reply::{ReplyBody, ReplyTransport, ReplyValidationError, ReviewId, submit_reply};

const VALIDATION_STATUS: u16 = 400;
const VALIDATION_CODE: &str = "VALIDATION_ERROR";

/// Reasons a bulk request cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkReplyError {
    /// The shared reply body failed validation.
    #[error("invalid reply body")]
    InvalidBody {
        /// Validation failure.
        #[source]
        source: ReplyValidationError,
    },
    /// One of the review identifiers failed validation.
    #[error("invalid review id at position {index}")]
    InvalidReviewId {
        /// Position of the identifier in the input.
        index: usize,
        /// Validation failure.
        #[source]
        source: ReplyValidationError,
    },
}

impl From<BulkReplyError> for ApiError {
    fn from(error: BulkReplyError) -> Self {
        let detail = match &error {
            BulkReplyError::InvalidBody { source }
            | BulkReplyError::InvalidReviewId { source, .. } => source.to_string(),
        };
        Self::new(format!("{error}: {detail}"), VALIDATION_STATUS).with_code(VALIDATION_CODE)
    }
}

/// One reply body applied to a set of reviews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReplyRequest {
    review_ids: Vec<ReviewId>,
    body: ReplyBody,
}

impl BulkReplyRequest {
    /// Build a request; duplicate identifiers collapse to their first occurrence.
    #[must_use]
    pub fn new(review_ids: impl IntoIterator<Item = ReviewId>, body: ReplyBody) -> Self {
        let mut seen = HashSet::new();
        let review_ids = review_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self { review_ids, body }
    }

    /// Validate raw identifiers and text, then build a request.
    ///
    /// # Errors
    /// Returns [`BulkReplyError`] for a blank identifier or an invalid body.
    pub fn parse<I, S>(
        review_ids: I,
        text: impl Into<String>,
        is_public: bool,
    ) -> Result<Self, BulkReplyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let body = ReplyBody::new(text, is_public)
            .map_err(|source| BulkReplyError::InvalidBody { source })?;
        let ids = review_ids
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                ReviewId::new(raw).map_err(|source| BulkReplyError::InvalidReviewId { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(ids, body))
    }

    /// Reviews to reply to, in submission order.
    #[must_use]
    pub fn review_ids(&self) -> &[ReviewId] {
        &self.review_ids
    }

    /// Shared reply body.
    #[must_use]
    pub const fn body(&self) -> &ReplyBody {
        &self.body
    }

    /// Number of reviews in the request.
    #[must_use]
    pub fn len(&self) -> usize {
        self.review_ids.len()
    }

    /// Whether the request names no reviews.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.review_ids.is_empty()
    }
}

/// Snapshot of a bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReplyProgress {
    /// Reviews finished, successfully or not.
    pub completed: usize,
    /// Reviews in the run.
    pub total: usize,
    /// Review most recently picked up by a worker.
    pub current_review: Option<ReviewId>,
    /// Reviews the backend accepted.
    pub succeeded: usize,
    /// Reviews that failed.
    pub failed: usize,
}

impl BulkReplyProgress {
    fn started(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Return to the idle `{0, 0, none}` state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether every review in a non-empty run has finished.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }

    /// Completion ratio in `0.0..=1.0`; zero for an idle snapshot.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Receives progress snapshots during a run.
///
/// Called synchronously from the aggregator; panics are caught and logged.
pub trait ProgressObserver: Send {
    /// Handle one snapshot.
    fn on_progress(&mut self, progress: &BulkReplyProgress);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&BulkReplyProgress) + Send,
{
    fn on_progress(&mut self, progress: &BulkReplyProgress) {
        self(progress);
    }
}

/// Observer that discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreProgress;

impl ProgressObserver for IgnoreProgress {
    fn on_progress(&mut self, _progress: &BulkReplyProgress) {}
}

/// Cooperative stop signal checked by workers before each dequeue.
///
/// Replies already in flight still finish; a rate-limit cooldown is cut short.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<FlagInner>);

#[derive(Debug, Default)]
struct FlagInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationFlag {
    /// Build an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask workers to stop picking up reviews.
    pub fn cancel(&self) {
        self.0.cancelled.store(true, Ordering::SeqCst);
        self.0.notify.notify_waiters();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.0.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// A review that failed during a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReplyFailure {
    /// Review that failed.
    pub review_id: ReviewId,
    /// Normalised failure.
    pub error: ApiError,
}

/// Final tally of a bulk run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReplyReport {
    /// Reviews in the run.
    pub total: usize,
    /// Reviews finished.
    pub completed: usize,
    /// Reviews the backend accepted.
    pub succeeded: usize,
    /// Reviews that failed for any reason.
    pub failed: usize,
    /// Failures caused by rate limiting; included in `failed`.
    pub rate_limited: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
    /// Reviews the backend accepted, in completion order.
    pub replied: Vec<ReviewId>,
    /// Per-review failures in completion order.
    pub failures: Vec<BulkReplyFailure>,
}

impl BulkReplyReport {
    /// Whether any item failed, which front ends surface as a degraded API.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.failed > 0
    }
}

/// Drives a [`BulkReplyRequest`] through a bounded pool of workers.
pub struct BulkReplyOrchestrator<T: ?Sized> {
    transport: Arc<T>,
    guard: RateLimitGuard,
    concurrency: usize,
    metrics: Option<Metrics>,
    cancellation: Option<CancellationFlag>,
}

impl<T> BulkReplyOrchestrator<T>
where
    T: ReplyTransport + ?Sized + 'static,
{
    /// Build an orchestrator with the default concurrency.
    #[must_use]
    pub fn new(transport: Arc<T>, guard: RateLimitGuard) -> Self {
        Self {
            transport,
            guard,
            concurrency: BulkReplySettings::default().concurrency,
            metrics: None,
            cancellation: None,
        }
    }

    /// Build an orchestrator whose concurrency and guard follow `settings`.
    #[must_use]
    pub fn from_settings(transport: Arc<T>, settings: &BulkReplySettings) -> Self {
        Self::new(transport, RateLimitGuard::from_settings(settings))
            .with_concurrency(settings.concurrency)
    }

    /// Override the worker count; values below one are raised to one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Record reply outcomes into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Stop dequeuing once `flag` is set.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Configured worker ceiling.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Shared rate-limit guard.
    #[must_use]
    pub const fn guard(&self) -> &RateLimitGuard {
        &self.guard
    }

    /// Submit the request's reply to every review and report the tally.
    ///
    /// Item failures never fail the run. The observer sees one snapshot at
    /// start, one per pickup and one per finished review; none for an empty
    /// request.
    ///
    /// Dropping the returned future stops further pickups; replies already
    /// in flight still reach the backend.
    ///
    /// # Errors
    /// Returns an [`ApiError`] only when a worker task itself dies. A
    /// panicking transport is reported as an item failure instead.
    pub async fn run<O>(
        &self,
        request: BulkReplyRequest,
        mut observer: O,
    ) -> ServiceResult<BulkReplyReport>
    where
        O: ProgressObserver,
    {
        let total = request.len();
        if total == 0 {
            debug!("bulk reply requested with no reviews");
            return Ok(BulkReplyReport::default());
        }

        let workers = self.concurrency.min(total);
        info!(total, workers, "starting bulk reply");
        if let Some(metrics) = &self.metrics {
            metrics.inc_bulk_run();
        }

        let mut progress = BulkReplyProgress::started(total);
        notify(&mut observer, &progress);

        let BulkReplyRequest { review_ids, body } = request;
        let queue = Arc::new(ReplyQueue::new(review_ids));
        let body = Arc::new(body);
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let ctx = WorkerContext {
                worker,
                transport: Arc::clone(&self.transport),
                queue: Arc::clone(&queue),
                body: Arc::clone(&body),
                guard: self.guard.clone(),
                metrics: self.metrics.clone(),
                cancellation: self.cancellation.clone(),
                events: events_tx.clone(),
            };
            pool.spawn(ctx.drain());
        }
        drop(events_tx);

        let mut report = BulkReplyReport {
            total,
            ..BulkReplyReport::default()
        };
        while let Some(event) = events_rx.recv().await {
            match event {
                WorkerEvent::Started(review_id) => {
                    progress.current_review = Some(review_id);
                }
                WorkerEvent::Finished { review_id, result } => {
                    progress.completed += 1;
                    match result {
                        Ok(()) => {
                            progress.succeeded += 1;
                            report.replied.push(review_id);
                        }
                        Err(error) => {
                            progress.failed += 1;
                            if error.is_rate_limited() {
                                report.rate_limited += 1;
                            }
                            report.failures.push(BulkReplyFailure { review_id, error });
                        }
                    }
                }
            }
            notify(&mut observer, &progress);
        }

        let mut worker_failure = None;
        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "bulk reply worker terminated abnormally");
                if worker_failure.is_none() {
                    worker_failure = Some(err);
                }
            }
        }
        if let Some(err) = worker_failure {
            return Err(ApiError::new(
                format!("bulk reply worker failed: {err}"),
                DEFAULT_ERROR_STATUS,
            ));
        }

        report.completed = progress.completed;
        report.succeeded = progress.succeeded;
        report.failed = progress.failed;
        report.cancelled = report.completed < total
            && self
                .cancellation
                .as_ref()
                .is_some_and(CancellationFlag::is_cancelled);

        info!(
            total,
            succeeded = report.succeeded,
            failed = report.failed,
            rate_limited = report.rate_limited,
            cancelled = report.cancelled,
            "bulk reply finished"
        );
        Ok(report)
    }
}

fn notify<O: ProgressObserver>(observer: &mut O, progress: &BulkReplyProgress) {
    if catch_unwind(AssertUnwindSafe(|| observer.on_progress(progress))).is_err() {
        warn!(
            completed = progress.completed,
            total = progress.total,
            "progress observer panicked; continuing"
        );
    }
}

struct ReplyQueue {
    pending: Mutex<VecDeque<ReviewId>>,
}

impl ReplyQueue {
    fn new(review_ids: Vec<ReviewId>) -> Self {
        Self {
            pending: Mutex::new(review_ids.into()),
        }
    }

    fn pop(&self) -> Option<ReviewId> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

enum WorkerEvent {
    Started(ReviewId),
    Finished {
        review_id: ReviewId,
        result: ServiceResult<()>,
    },
}

/// Keeps the in-flight gauge balanced however the submission ends.
struct InFlight(Option<Metrics>);

impl InFlight {
    fn start(metrics: Option<Metrics>) -> Self {
        if let Some(metrics) = &metrics {
            metrics.reply_started();
        }
        Self(metrics)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(metrics) = &self.0 {
            metrics.reply_finished();
        }
    }
}

struct WorkerContext<T: ?Sized> {
    worker: usize,
    transport: Arc<T>,
    queue: Arc<ReplyQueue>,
    body: Arc<ReplyBody>,
    guard: RateLimitGuard,
    metrics: Option<Metrics>,
    cancellation: Option<CancellationFlag>,
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl<T> WorkerContext<T>
where
    T: ReplyTransport + ?Sized + 'static,
{
    async fn drain(self) {
        loop {
            if self
                .cancellation
                .as_ref()
                .is_some_and(CancellationFlag::is_cancelled)
            {
                debug!(worker = self.worker, "bulk reply cancelled; worker stopping");
                break;
            }
            let Some(review_id) = self.queue.pop() else {
                break;
            };
            if self.events.send(WorkerEvent::Started(review_id.clone())).is_err() {
                break;
            }

            let result = self.submit(&review_id).await;

            match &result {
                Ok(()) => self.record(ReplyOutcome::Success),
                Err(error) if error.is_rate_limited() => {
                    self.record(ReplyOutcome::RateLimited);
                    if self.guard.arm()
                        && let Some(metrics) = &self.metrics
                    {
                        metrics.inc_rate_limit_cooldown();
                    }
                    warn!(
                        worker = self.worker,
                        review_id = %review_id,
                        status = error.status,
                        code = error.code.as_deref().unwrap_or_default(),
                        cooldown_ms = u64::try_from(self.guard.cooldown_time().as_millis())
                            .unwrap_or(u64::MAX),
                        "reply rate limited; worker cooling down"
                    );
                    self.cool_down(self.guard.cooldown_time()).await;
                }
                Err(error) => {
                    self.record(ReplyOutcome::Failure);
                    warn!(
                        worker = self.worker,
                        review_id = %review_id,
                        status = error.status,
                        code = error.code.as_deref().unwrap_or_default(),
                        error = %error.message,
                        "reply failed; continuing with next review"
                    );
                }
            }

            if self
                .events
                .send(WorkerEvent::Finished { review_id, result })
                .is_err()
            {
                break;
            }
        }
    }

    /// Run one submission on a detached task so a panic is contained and a
    /// dropped run does not abort the request mid-flight.
    async fn submit(&self, review_id: &ReviewId) -> ServiceResult<()> {
        let in_flight = InFlight::start(self.metrics.clone());
        let transport = Arc::clone(&self.transport);
        let body = Arc::clone(&self.body);
        let id = review_id.clone();
        let handle = tokio::spawn(async move {
            let _in_flight = in_flight;
            submit_reply(transport.as_ref(), &id, &body).await
        });
        match handle.await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    worker = self.worker,
                    review_id = %review_id,
                    error = %err,
                    "reply submission panicked"
                );
                Err(ApiError::new(
                    format!("reply submission failed: {err}"),
                    DEFAULT_ERROR_STATUS,
                ))
            }
        }
    }

    async fn cool_down(&self, cooldown: Duration) {
        match &self.cancellation {
            Some(flag) => {
                tokio::select! {
                    () = tokio::time::sleep(cooldown) => {}
                    () = flag.cancelled() => {
                        debug!(worker = self.worker, "cooldown interrupted by cancellation");
                    }
                }
            }
            None => tokio::time::sleep(cooldown).await,
        }
    }

    fn record(&self, outcome: ReplyOutcome) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_reply(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> ReplyBody {
        ReplyBody::new("Thank you!", true).expect("valid body")
    }

    fn ids(raw: &[&str]) -> Vec<ReviewId> {
        raw.iter()
            .map(|id| ReviewId::new(*id).expect("valid id"))
            .collect()
    }

    #[test]
    fn request_collapses_duplicates_in_order() {
        let request = BulkReplyRequest::new(ids(&["b", "a", "b", "c", "a"]), body());
        assert_eq!(request.review_ids(), ids(&["b", "a", "c"]).as_slice());
        assert_eq!(request.len(), 3);
    }

    #[test]
    fn parse_reports_the_offending_input() {
        let blank_body = BulkReplyRequest::parse(["r-1"], "  ", true);
        assert_eq!(
            blank_body,
            Err(BulkReplyError::InvalidBody {
                source: ReplyValidationError::EmptyText,
            })
        );

        let blank_id = BulkReplyRequest::parse(["r-1", ""], "Thanks", true);
        assert_eq!(
            blank_id,
            Err(BulkReplyError::InvalidReviewId {
                index: 1,
                source: ReplyValidationError::EmptyReviewId,
            })
        );
    }

    #[test]
    fn bulk_errors_map_to_validation_api_errors() {
        let error = ApiError::from(BulkReplyError::InvalidBody {
            source: ReplyValidationError::EmptyText,
        });
        assert_eq!(error.status, 400);
        assert_eq!(error.code.as_deref(), Some("VALIDATION_ERROR"));
        assert!(error.message.contains("reply text must not be empty"));
    }

    #[test]
    fn progress_reset_returns_to_idle() {
        let mut progress = BulkReplyProgress {
            completed: 2,
            total: 4,
            current_review: ids(&["r-2"]).pop(),
            succeeded: 1,
            failed: 1,
        };
        assert!(!progress.is_complete());
        assert!((progress.fraction() - 0.5).abs() < f64::EPSILON);

        progress.reset();
        assert_eq!(progress, BulkReplyProgress::default());
        assert!(!progress.is_complete());
        assert!(progress.fraction().abs() < f64::EPSILON);
    }

    #[test]
    fn cancellation_flag_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_wakes_pending_waiters() {
        let flag = CancellationFlag::new();
        let waiter = flag.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        tokio::task::yield_now().await;
        flag.cancel();
        handle.await.expect("waiter finishes");
        flag.cancelled().await;
    }

    #[test]
    fn observer_panics_are_contained() {
        let mut calls = 0;
        let mut observer = |_: &BulkReplyProgress| {
            calls += 1;
            panic!("observer bug");
        };
        notify(&mut observer, &BulkReplyProgress::started(1));
        notify(&mut observer, &BulkReplyProgress::started(1));
        assert_eq!(calls, 2);
    }
}
