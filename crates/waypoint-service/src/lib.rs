//! # waypoint-service: Routing Service
//!
//! Wraps the shortest-path algorithms of `waypoint-routing` in a request
//! contract suitable for callers that retry:
//!
//! - **Idempotency** ([`cache`]): responses are stored by request id. A
//!   repeated id returns the stored response unchanged, and concurrent
//!   duplicates wait for the single in-flight computation.
//! - **Retries** ([`retry`]): transient execution failures are retried with
//!   exponential backoff and jitter, bounded by `max_attempts`.
//! - **Deadlines**: a request timeout bounds execution and backoff alike.
//!   Exceeding it yields `TIMEOUT`.
//! - **Observability** ([`observability`], [`telemetry`]): one structured
//!   event per call, `metrics` counters, and per-instance statistics.
//!
//! ```no_run
//! use std::sync::Arc;
//! use waypoint_core::{EdgeSpec, Graph, RequestId, RouteRequest};
//! use waypoint_service::{RoutingService, ServiceConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = Graph::from_edges([EdgeSpec::new("A", "B", 1.0)])?;
//! let service = RoutingService::new(Arc::new(graph), ServiceConfig::default())?;
//! let response = service
//!     .compute_route(RouteRequest::new(RequestId::generate(), "A", "B"))
//!     .await;
//! assert_eq!(response.cost(), Some(1.0));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod observability;
pub mod response;
pub mod retry;
pub mod service;
pub mod state;
pub mod telemetry;

pub use cache::{Claim, IdempotencyStore, InFlight, InMemoryStore};
pub use config::{CacheConfig, ConfigError, LoggingConfig, RetryConfig, ServiceConfig};
pub use error::{ExecutionError, RouteError};
pub use executor::{AlgorithmExecutor, ExecutionPlan, RouteExecutor};
pub use observability::{EventSink, MemorySink, RouteEvent, StatsSnapshot, TracingSink};
pub use response::{ErrorDetail, ResponseShapeError, RouteResponse, RouteStatus};
pub use retry::Backoff;
pub use service::RoutingService;
pub use state::{Lifecycle, RouteState, StateError};
pub use telemetry::{init_tracing, TelemetryError};
