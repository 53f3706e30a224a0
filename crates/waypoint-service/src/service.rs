//! # Routing Service
//!
//! [`RoutingService::compute_route`] turns a [`RouteRequest`] into a
//! [`RouteResponse`]. It never fails: every error becomes a response status.
//!
//! ## Request flow
//!
//! 1. Claim the request id in the idempotency store. A stored response is
//!    returned unchanged. A duplicate in flight is awaited.
//! 2. Validate the request against the graph.
//! 3. Select the algorithm from graph metadata and the optional override.
//! 4. Execute on the blocking pool under the request deadline.
//! 5. Retry transient failures with exponential backoff and jitter. The
//!    deadline covers every attempt and every backoff sleep.
//! 6. Store the response, emit one event, return.
//!
//! The store claim is released if the caller drops the future mid-flight,
//! so waiting duplicates can take over.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};
use waypoint_core::{AlgorithmKind, Graph, RequestId, RouteRequest, Validator};
use waypoint_routing::{select_algorithm, Deadline, SearchOptions, ShortestPath};

use crate::cache::{Claim, IdempotencyStore, InMemoryStore};
use crate::config::{ConfigError, ServiceConfig};
use crate::error::{ExecutionError, RouteError};
use crate::executor::{AlgorithmExecutor, ExecutionPlan, RouteExecutor};
use crate::observability::{self, EventSink, RouteEvent, ServiceStats, StatsSnapshot, TracingSink};
use crate::response::RouteResponse;
use crate::retry::Backoff;
use crate::state::{Lifecycle, RouteState};

/// Idempotent, retrying shortest-path service over one shared graph.
pub struct RoutingService {
    graph: Arc<Graph>,
    config: ServiceConfig,
    validator: Validator,
    executor: Arc<dyn RouteExecutor>,
    store: Arc<dyn IdempotencyStore>,
    sink: Arc<dyn EventSink>,
    stats: ServiceStats,
}

impl std::fmt::Debug for RoutingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingService")
            .field("graph", self.graph.metadata())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Releases an unfinished claim when dropped.
struct ClaimGuard<'a> {
    store: &'a dyn IdempotencyStore,
    id: &'a RequestId,
    armed: bool,
}

impl ClaimGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(request_id = %self.id, "abandoning unfinished route computation");
            self.store.abandon(self.id);
        }
    }
}

/// Bookkeeping of one request's execution attempts.
#[derive(Debug, Default)]
struct Attempts {
    count: u32,
    backoff_ms: Vec<u64>,
    algorithm: Option<AlgorithmKind>,
}

impl RoutingService {
    /// Service with the default executor, an in-memory store sized by
    /// `config.cache`, and the tracing event sink.
    pub fn new(graph: Arc<Graph>, config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            validator: Validator::new(config.limits),
            store: InMemoryStore::from_config(&config.cache).shared(),
            executor: Arc::new(AlgorithmExecutor),
            sink: Arc::new(TracingSink),
            stats: ServiceStats::default(),
            graph,
            config,
        })
    }

    pub fn with_executor(mut self, executor: Arc<dyn RouteExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.store.len())
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.store.clear();
        debug!("idempotency cache cleared");
    }

    /// Compute, or recall, the route for `request`.
    pub async fn compute_route(&self, request: RouteRequest) -> RouteResponse {
        let id = request.request_id.clone();
        loop {
            match self.store.try_claim(&id) {
                Claim::Completed(response) => return self.finish(response, true, Vec::new()),
                Claim::Pending(in_flight) => {
                    debug!(request_id = %id, "waiting for in-flight computation");
                    if let Some(response) = in_flight.wait().await {
                        return self.finish(response, true, Vec::new());
                    }
                }
                Claim::Acquired => break,
            }
        }

        let guard = ClaimGuard {
            store: self.store.as_ref(),
            id: &id,
            armed: true,
        };
        let (response, backoff_ms) = self.run(&request).await;
        self.store.put(&id, response.clone());
        guard.disarm();
        self.finish(response, false, backoff_ms)
    }

    fn finish(&self, response: RouteResponse, cache_hit: bool, backoff_ms: Vec<u64>) -> RouteResponse {
        let event = RouteEvent::from_response(&response, cache_hit, backoff_ms);
        self.stats.record(&event);
        observability::record_event(&event);
        self.sink.emit(&event);
        response
    }

    async fn run(&self, request: &RouteRequest) -> (RouteResponse, Vec<u64>) {
        let started = Instant::now();
        let mut lifecycle = Lifecycle::new(request.request_id.clone());
        let mut attempts = Attempts::default();
        let outcome = self.drive(request, &mut lifecycle, &mut attempts).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;

        let response = match outcome {
            Ok(path) => {
                RouteResponse::success(request.request_id.clone(), path, elapsed_ms, attempts.count)
            }
            Err(err) => RouteResponse::failed(
                request.request_id.clone(),
                err.status(),
                err.detail(),
                attempts.algorithm,
                elapsed_ms,
                attempts.count,
            ),
        };
        lifecycle.advance(RouteState::terminal(response.status()));
        (response, attempts.backoff_ms)
    }

    async fn drive(
        &self,
        request: &RouteRequest,
        lifecycle: &mut Lifecycle,
        attempts: &mut Attempts,
    ) -> Result<ShortestPath, RouteError> {
        lifecycle.advance(RouteState::Validating);
        self.validator.validate(&self.graph, request)?;

        lifecycle.advance(RouteState::Selecting);
        let selection = select_algorithm(self.graph.metadata(), request.algorithm)?;
        attempts.algorithm = Some(selection.algorithm);
        debug!(
            request_id = %request.request_id,
            algorithm = %selection.algorithm,
            reason = ?selection.reason,
            "algorithm selected"
        );

        if request.is_self_route() {
            if let Some(index) = self.graph.node_index(&request.start) {
                attempts.count = 1;
                lifecycle.advance(RouteState::Computing);
                let node = self.graph.node(index).clone();
                return Ok(ShortestPath::trivial(node, selection.algorithm));
            }
        }

        let deadline =
            Deadline::from_timeout(request.timeout().or_else(|| self.config.default_timeout()));
        let plan = ExecutionPlan {
            algorithm: selection.algorithm,
            start: request.start.clone(),
            goal: request.goal.clone(),
            options: SearchOptions {
                deadline,
                check_interval: self.config.deadline_check_interval,
            },
        };
        let max_attempts = self.config.retry.max_attempts;
        let mut backoff = Backoff::new(&self.config.retry);

        loop {
            lifecycle.advance(RouteState::Computing);
            if deadline.is_expired() {
                return Err(deadline.exceeded().into());
            }
            attempts.count += 1;

            let reason = match self.execute_once(&plan).await {
                Ok(path) => {
                    debug_assert!(
                        path.verify(&self.graph, &plan.start, &plan.goal).is_ok(),
                        "executor returned an inconsistent path"
                    );
                    return Ok(path);
                }
                Err(ExecutionError::Search(err)) => return Err(err.into()),
                Err(ExecutionError::Transient(reason)) => reason,
            };

            if attempts.count >= max_attempts {
                warn!(
                    request_id = %request.request_id,
                    attempts = attempts.count,
                    "route computation failed, retries exhausted: {reason}"
                );
                return Err(RouteError::RetriesExhausted {
                    attempts: attempts.count,
                    last_error: reason,
                });
            }

            let delay = backoff.next_delay(&mut rand::thread_rng());
            lifecycle.advance(RouteState::Retry);
            if deadline.remaining().is_some_and(|left| delay >= left) {
                return Err(deadline.exceeded().into());
            }
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            warn!(
                request_id = %request.request_id,
                attempt = attempts.count,
                max_attempts,
                delay_ms,
                "transient route computation failure, retrying: {reason}"
            );
            self.stats.record_retry();
            observability::record_retry();
            attempts.backoff_ms.push(delay_ms);
            tokio::time::sleep(delay).await;
        }
    }

    async fn execute_once(&self, plan: &ExecutionPlan) -> Result<ShortestPath, ExecutionError> {
        self.stats.record_execution();
        let graph = Arc::clone(&self.graph);
        let executor = Arc::clone(&self.executor);
        let task_plan = plan.clone();
        let task = tokio::task::spawn_blocking(move || executor.execute(&graph, &task_plan));

        let joined = match plan.options.deadline.remaining() {
            Some(left) => match tokio::time::timeout(left, task).await {
                Ok(joined) => joined,
                Err(_) => return Err(ExecutionError::Search(plan.options.deadline.exceeded())),
            },
            None => task.await,
        };
        joined.unwrap_or_else(|e| {
            Err(ExecutionError::Transient(format!(
                "execution task failed: {e}"
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use waypoint_core::EdgeSpec;

    use crate::response::RouteStatus;

    fn service(config: ServiceConfig) -> RoutingService {
        let graph = Graph::from_edges([
            EdgeSpec::new("A", "B", 1.0),
            EdgeSpec::new("B", "C", 2.0),
        ])
        .unwrap();
        RoutingService::new(Arc::new(graph), config).unwrap()
    }

    fn request(id: &str, start: &str, goal: &str) -> RouteRequest {
        RouteRequest::new(RequestId::new(id).unwrap(), start, goal)
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ServiceConfig {
            retry: crate::config::RetryConfig {
                max_attempts: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let graph = Arc::new(Graph::empty());
        assert!(RoutingService::new(graph, config).is_err());
    }

    #[tokio::test]
    async fn default_timeout_applies_without_request_timeout() {
        let svc = service(ServiceConfig {
            default_timeout_ms: Some(0),
            ..Default::default()
        });
        let response = svc.compute_route(request("t", "A", "C")).await;
        assert_eq!(response.status(), RouteStatus::Timeout);
        assert_eq!(response.error().map(|e| e.kind.as_str()), Some("TIMEOUT"));
        assert_eq!(response.attempt_count(), 0);
        assert_eq!(svc.stats().executions, 0);
    }

    #[tokio::test]
    async fn dropped_call_releases_claim() {
        let slow = |graph: &Graph, plan: &ExecutionPlan| {
            std::thread::sleep(Duration::from_millis(200));
            AlgorithmExecutor.execute(graph, plan)
        };
        let svc = service(ServiceConfig::default()).with_executor(Arc::new(slow));
        let id = RequestId::new("dropped").unwrap();

        let attempt = tokio::time::timeout(
            Duration::from_millis(20),
            svc.compute_route(request("dropped", "A", "C")),
        )
        .await;
        assert!(attempt.is_err(), "call should have been cut short");
        assert!(matches!(svc.store.try_claim(&id), Claim::Acquired));
    }

    #[tokio::test]
    async fn stats_and_clear_cache() {
        let svc = service(ServiceConfig::default());
        svc.compute_route(request("1", "A", "C")).await;
        svc.compute_route(request("1", "A", "C")).await;
        svc.compute_route(request("2", "C", "A")).await;

        let stats = svc.stats();
        assert_eq!(stats.requests_total, 3);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.executions, 2);
        assert_eq!(stats.cache_size, 2);
        assert_eq!(stats.success_rate, 0.5);

        svc.clear_cache();
        assert_eq!(svc.stats().cache_size, 0);
        svc.compute_route(request("1", "A", "C")).await;
        assert_eq!(svc.stats().executions, 3);
    }

    #[tokio::test]
    async fn forced_algorithm_is_reported() {
        let svc = service(ServiceConfig::default());
        let response = svc
            .compute_route(
                request("forced", "A", "C").with_algorithm(AlgorithmKind::BellmanFord),
            )
            .await;
        assert_eq!(response.algorithm_used(), Some(AlgorithmKind::BellmanFord));
        assert_eq!(response.cost(), Some(3.0));
        assert_eq!(response.attempt_count(), 1);
    }
}
