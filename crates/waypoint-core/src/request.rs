//! # Route Requests
//!
//! The caller-facing input of the routing engine, plus the tag naming the
//! two shortest-path algorithms.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::identity::RequestId;

/// The shortest-path algorithms Waypoint can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    /// Priority-queue search. Requires non-negative weights. O(E log V).
    Dijkstra,
    /// Repeated edge relaxation. Any weights, detects negative cycles. O(V·E).
    BellmanFord,
}

impl AlgorithmKind {
    /// Stable name used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dijkstra => "dijkstra",
            Self::BellmanFord => "bellman-ford",
        }
    }

    /// Whether the algorithm is correct on graphs with negative edges.
    pub fn supports_negative_weights(self) -> bool {
        matches!(self, Self::BellmanFord)
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dijkstra => write!(f, "Dijkstra"),
            Self::BellmanFord => write!(f, "Bellman-Ford"),
        }
    }
}

/// A request for the cheapest path from `start` to `goal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Idempotency key. Resubmitting the same key returns the same response.
    pub request_id: RequestId,
    /// Start node id.
    pub start: String,
    /// Goal node id.
    pub goal: String,
    /// Wall-clock budget for the computation, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Run this algorithm instead of the automatic choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<AlgorithmKind>,
}

impl RouteRequest {
    pub fn new(request_id: RequestId, start: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            request_id,
            start: start.into(),
            goal: goal.into(),
            timeout_ms: None,
            algorithm: None,
        }
    }

    /// Bound the computation by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Force a specific algorithm.
    pub fn with_algorithm(mut self, algorithm: AlgorithmKind) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// The requested timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Whether start and goal name the same node.
    pub fn is_self_route(&self) -> bool {
        self.start == self.goal
    }
}
