//! Prometheus-backed metrics for reply submission.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Counters cover reply outcomes and rate-limit cooldowns; one gauge tracks
//!   submissions currently in flight.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome label attached to reply submission counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The backend accepted the reply.
    Success,
    /// The backend rejected the reply with HTTP 429.
    RateLimited,
    /// Any other failure.
    Failure,
}

impl ReplyOutcome {
    const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RateLimited => "rate_limited",
            Self::Failure => "failure",
        }
    }
}

/// Prometheus-backed metrics registry shared by the reply pipeline.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    replies_submitted_total: IntCounterVec,
    bulk_runs_total: IntCounter,
    rate_limit_cooldowns_total: IntCounter,
    replies_in_flight: IntGauge,
}

/// Snapshot of the reply counters for reporting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Replies accepted by the backend.
    pub replies_succeeded_total: u64,
    /// Replies rejected with HTTP 429.
    pub replies_rate_limited_total: u64,
    /// Replies rejected for any other reason.
    pub replies_failed_total: u64,
    /// Bulk runs started.
    pub bulk_runs_total: u64,
    /// Cooldown windows armed after rate limiting.
    pub rate_limit_cooldowns_total: u64,
    /// Replies currently in flight.
    pub replies_in_flight: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let replies_submitted_total = IntCounterVec::new(
            Opts::new(
                "replies_submitted_total",
                "Review replies submitted by outcome",
            ),
            &["outcome"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "replies_submitted_total",
            source,
        })?;
        let bulk_runs_total =
            IntCounter::with_opts(Opts::new("bulk_runs_total", "Bulk reply runs started"))
                .map_err(|source| TelemetryError::MetricsCollector {
                    name: "bulk_runs_total",
                    source,
                })?;
        let rate_limit_cooldowns_total = IntCounter::with_opts(Opts::new(
            "rate_limit_cooldowns_total",
            "Cooldown windows armed after HTTP 429 responses",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "rate_limit_cooldowns_total",
            source,
        })?;
        let replies_in_flight = IntGauge::with_opts(Opts::new(
            "bulk_replies_in_flight",
            "Reply submissions currently awaiting a response",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "bulk_replies_in_flight",
            source,
        })?;

        register(&registry, "replies_submitted_total", &replies_submitted_total)?;
        register(&registry, "bulk_runs_total", &bulk_runs_total)?;
        register(
            &registry,
            "rate_limit_cooldowns_total",
            &rate_limit_cooldowns_total,
        )?;
        register(&registry, "bulk_replies_in_flight", &replies_in_flight)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                replies_submitted_total,
                bulk_runs_total,
                rate_limit_cooldowns_total,
                replies_in_flight,
            }),
        })
    }

    /// Count a finished reply submission.
    pub fn inc_reply(&self, outcome: ReplyOutcome) {
        self.inner
            .replies_submitted_total
            .with_label_values(&[outcome.label()])
            .inc();
    }

    /// Count a bulk run start.
    pub fn inc_bulk_run(&self) {
        self.inner.bulk_runs_total.inc();
    }

    /// Count a cooldown window being armed.
    pub fn inc_rate_limit_cooldown(&self) {
        self.inner.rate_limit_cooldowns_total.inc();
    }

    /// Mark a submission as started.
    pub fn reply_started(&self) {
        self.inner.replies_in_flight.inc();
    }

    /// Mark a submission as finished.
    pub fn reply_finished(&self) {
        self.inner.replies_in_flight.dec();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the reply counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let outcome = |outcome: ReplyOutcome| {
            self.inner
                .replies_submitted_total
                .with_label_values(&[outcome.label()])
                .get()
        };
        MetricsSnapshot {
            replies_succeeded_total: outcome(ReplyOutcome::Success),
            replies_rate_limited_total: outcome(ReplyOutcome::RateLimited),
            replies_failed_total: outcome(ReplyOutcome::Failure),
            bulk_runs_total: self.inner.bulk_runs_total.get(),
            rate_limit_cooldowns_total: self.inner.rate_limit_cooldowns_total.get(),
            replies_in_flight: self.inner.replies_in_flight.get(),
        }
    }
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}
