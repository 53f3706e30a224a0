//! # Retry and Deadline Behavior
//!
//! - Transient failures are retried with strictly increasing backoff
//! - Exhausted retries surface as FAILURE
//! - Deterministic errors are never retried
//! - Deadlines produce TIMEOUT, during execution and during backoff

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use waypoint_core::{EdgeSpec, Graph, RequestId, RouteRequest};
use waypoint_routing::ShortestPath;
use waypoint_service::{
    AlgorithmExecutor, ExecutionError, ExecutionPlan, MemorySink, RetryConfig, RouteExecutor,
    RouteStatus, RoutingService, ServiceConfig,
};

/// Fails transiently for the first `failures` calls, then runs the search.
struct FlakyExecutor {
    failures: u32,
    calls: AtomicU32,
}

impl FlakyExecutor {
    fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteExecutor for FlakyExecutor {
    fn execute(&self, graph: &Graph, plan: &ExecutionPlan) -> Result<ShortestPath, ExecutionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(ExecutionError::Transient(format!("worker unavailable (call {call})")));
        }
        AlgorithmExecutor.execute(graph, plan)
    }
}

fn graph() -> Arc<Graph> {
    Arc::new(
        Graph::from_edges([
            EdgeSpec::new("A", "B", 1.0),
            EdgeSpec::new("B", "C", 1.0),
            EdgeSpec::new("C", "A", -3.0),
            EdgeSpec::new("S", "T", 2.0),
        ])
        .unwrap(),
    )
}

fn fast_retry(max_attempts: u32) -> ServiceConfig {
    ServiceConfig {
        retry: RetryConfig {
            max_attempts,
            initial_backoff_ms: 5,
            max_backoff_ms: 1_000,
            ..RetryConfig::default()
        },
        ..ServiceConfig::default()
    }
}

fn request(start: &str, goal: &str) -> RouteRequest {
    RouteRequest::new(RequestId::generate(), start, goal)
}

#[tokio::test]
async fn succeeds_on_nth_attempt_with_increasing_backoff() {
    let executor = FlakyExecutor::new(3);
    let sink = Arc::new(MemorySink::new());
    let svc = RoutingService::new(graph(), fast_retry(5))
        .unwrap()
        .with_executor(executor.clone())
        .with_sink(sink.clone());

    let response = svc.compute_route(request("S", "T")).await;

    assert_eq!(response.status(), RouteStatus::Success);
    assert_eq!(response.cost(), Some(2.0));
    assert_eq!(response.attempt_count(), 4);
    assert_eq!(executor.calls(), 4);

    let event = &sink.events()[0];
    assert_eq!(event.attempt_count, 4);
    assert_eq!(event.backoff_ms.len(), 3);
    assert!(
        event.backoff_ms.windows(2).all(|w| w[0] < w[1]),
        "{:?}",
        event.backoff_ms
    );
    assert!(event.backoff_ms.iter().all(|ms| *ms <= 1_000));
    assert_eq!(svc.stats().retries, 3);
}

#[tokio::test]
async fn backoff_is_capped_by_max_backoff() {
    let config = ServiceConfig {
        retry: RetryConfig {
            max_attempts: 6,
            initial_backoff_ms: 4,
            max_backoff_ms: 20,
            ..RetryConfig::default()
        },
        ..ServiceConfig::default()
    };
    let executor = FlakyExecutor::new(5);
    let sink = Arc::new(MemorySink::new());
    let svc = RoutingService::new(graph(), config)
        .unwrap()
        .with_executor(executor)
        .with_sink(sink.clone());

    let response = svc.compute_route(request("S", "T")).await;
    assert_eq!(response.attempt_count(), 6);
    let delays = &sink.events()[0].backoff_ms;
    assert_eq!(delays.len(), 5);
    assert!(delays.iter().all(|ms| *ms <= 20), "{delays:?}");
    assert_eq!(*delays.last().unwrap(), 20);
}

#[tokio::test]
async fn exhausted_retries_surface_as_failure() {
    let executor = FlakyExecutor::new(u32::MAX);
    let svc = RoutingService::new(graph(), fast_retry(3))
        .unwrap()
        .with_executor(executor.clone());

    let response = svc.compute_route(request("S", "T")).await;

    assert_eq!(response.status(), RouteStatus::Failure);
    assert_eq!(response.attempt_count(), 3);
    assert_eq!(executor.calls(), 3);
    let error = response.error().unwrap();
    assert_eq!(error.kind, "RETRIES_EXHAUSTED");
    assert!(error.message.contains("worker unavailable"), "{}", error.message);
}

#[tokio::test]
async fn algorithm_errors_are_not_retried() {
    let executor = FlakyExecutor::new(0);
    let svc = RoutingService::new(graph(), fast_retry(5))
        .unwrap()
        .with_executor(executor.clone());

    let response = svc.compute_route(request("A", "B")).await;
    assert_eq!(response.status(), RouteStatus::AlgorithmError);
    assert_eq!(response.attempt_count(), 1);
    assert_eq!(executor.calls(), 1);
}

#[tokio::test]
async fn zero_budget_times_out_before_execution() {
    let executor = FlakyExecutor::new(0);
    let svc = RoutingService::new(graph(), ServiceConfig::default())
        .unwrap()
        .with_executor(executor.clone());

    let response = svc
        .compute_route(request("S", "T").with_timeout(Duration::ZERO))
        .await;

    assert_eq!(response.status(), RouteStatus::Timeout);
    assert!(response.path().is_none());
    assert_eq!(response.error().unwrap().kind, "TIMEOUT");
    assert_eq!(response.attempt_count(), 0);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn slow_execution_times_out_and_is_not_retried() {
    let slow = |graph: &Graph, plan: &ExecutionPlan| {
        std::thread::sleep(Duration::from_millis(300));
        AlgorithmExecutor.execute(graph, plan)
    };
    let svc = RoutingService::new(graph(), fast_retry(5))
        .unwrap()
        .with_executor(Arc::new(slow));

    let response = svc
        .compute_route(request("S", "T").with_timeout(Duration::from_millis(30)))
        .await;
    assert_eq!(response.status(), RouteStatus::Timeout);
    assert_eq!(response.attempt_count(), 1);
}

#[tokio::test]
async fn deadline_shorter_than_backoff_times_out() {
    let config = ServiceConfig {
        retry: RetryConfig {
            max_attempts: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
            ..RetryConfig::default()
        },
        ..ServiceConfig::default()
    };
    let executor = FlakyExecutor::new(1);
    let svc = RoutingService::new(graph(), config)
        .unwrap()
        .with_executor(executor.clone());

    let response = svc
        .compute_route(request("S", "T").with_timeout(Duration::from_millis(100)))
        .await;
    assert_eq!(response.status(), RouteStatus::Timeout);
    assert_eq!(executor.calls(), 1);
}

#[tokio::test]
async fn timeouts_are_cached_like_other_outcomes() {
    let svc = RoutingService::new(graph(), ServiceConfig::default()).unwrap();
    let req = request("S", "T").with_timeout(Duration::ZERO);
    let first = svc.compute_route(req.clone()).await;
    let second = svc.compute_route(req).await;
    assert_eq!(first.status(), RouteStatus::Timeout);
    assert_eq!(first, second);
}
