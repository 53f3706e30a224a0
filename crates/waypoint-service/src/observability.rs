//! # Observability
//!
//! One [`RouteEvent`] is emitted per `compute_route` call, cache hits
//! included. Events go to an [`EventSink`]. The default [`TracingSink`]
//! writes a structured `tracing` event at `info`. [`MemorySink`] collects
//! events for inspection in tests.
//!
//! Counters are kept twice: per service instance in [`ServiceStats`], and
//! process-wide through the `metrics` facade under the names below.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use waypoint_core::{AlgorithmKind, RequestId};

use crate::response::{RouteResponse, RouteStatus};

pub const METRIC_REQUESTS: &str = "waypoint_route_requests_total";
pub const METRIC_CACHE_HITS: &str = "waypoint_route_cache_hits_total";
pub const METRIC_RETRIES: &str = "waypoint_route_retries_total";
pub const METRIC_COMPUTE_SECONDS: &str = "waypoint_route_compute_seconds";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Structured record of one `compute_route` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEvent {
    pub request_id: RequestId,
    pub algorithm_used: Option<AlgorithmKind>,
    pub status: RouteStatus,
    pub attempt_count: u32,
    pub compute_time_ms: f64,
    pub cache_hit: bool,
    /// Backoff delays slept between attempts, in order.
    pub backoff_ms: Vec<u64>,
    pub emitted_at: DateTime<Utc>,
}

impl RouteEvent {
    pub fn from_response(response: &RouteResponse, cache_hit: bool, backoff_ms: Vec<u64>) -> Self {
        Self {
            request_id: response.request_id().clone(),
            algorithm_used: response.algorithm_used(),
            status: response.status(),
            attempt_count: response.attempt_count(),
            compute_time_ms: response.compute_time_ms(),
            cache_hit,
            backoff_ms,
            emitted_at: Utc::now(),
        }
    }
}

/// Receiver of route events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RouteEvent);
}

/// Writes each event as a `tracing` event on the `waypoint::route` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &RouteEvent) {
        tracing::info!(
            target: "waypoint::route",
            request_id = %event.request_id,
            algorithm_used = event.algorithm_used.map_or("none", AlgorithmKind::as_str),
            status = event.status.as_str(),
            attempt_count = event.attempt_count,
            compute_time_ms = event.compute_time_ms,
            cache_hit = event.cache_hit,
            backoff_ms = ?event.backoff_ms,
            "route request completed"
        );
    }
}

/// Keeps every emitted event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<RouteEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RouteEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &RouteEvent) {
        self.events.lock().push(event.clone());
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

pub(crate) fn record_event(event: &RouteEvent) {
    metrics::counter!(METRIC_REQUESTS, "status" => event.status.as_str()).increment(1);
    if event.cache_hit {
        metrics::counter!(METRIC_CACHE_HITS).increment(1);
        return;
    }
    if let Some(algorithm) = event.algorithm_used {
        metrics::histogram!(METRIC_COMPUTE_SECONDS, "algorithm" => algorithm.as_str())
            .record(event.compute_time_ms / 1_000.0);
    }
}

pub(crate) fn record_retry() {
    metrics::counter!(METRIC_RETRIES).increment(1);
}

// ---------------------------------------------------------------------------
// Per-instance statistics
// ---------------------------------------------------------------------------

/// Counters owned by one service instance.
#[derive(Debug, Default)]
pub struct ServiceStats {
    requests: AtomicU64,
    successes: AtomicU64,
    errors: AtomicU64,
    cache_hits: AtomicU64,
    executions: AtomicU64,
    retries: AtomicU64,
}

/// Point-in-time copy of [`ServiceStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub requests_total: u64,
    pub successes: u64,
    pub errors: u64,
    pub cache_hits: u64,
    /// Executor invocations, retries included.
    pub executions: u64,
    pub retries: u64,
    pub cache_size: usize,
    /// Fraction of computed (non-cached) responses that succeeded.
    pub success_rate: f64,
}

impl ServiceStats {
    pub(crate) fn record(&self, event: &RouteEvent) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if event.cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else if event.status.is_success() {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_execution(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, cache_size: usize) -> StatsSnapshot {
        let successes = self.successes.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let computed = successes + errors;
        StatsSnapshot {
            requests_total: self.requests.load(Ordering::Relaxed),
            successes,
            errors,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            cache_size,
            success_rate: if computed == 0 {
                0.0
            } else {
                successes as f64 / computed as f64
            },
        }
    }
}
