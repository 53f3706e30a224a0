//! # Search Errors
//!
//! [`AlgorithmError`] covers deterministic failures intrinsic to the input
//! graph. [`SearchError`] adds the outcomes a search can end in besides a
//! path: unreachable goal, exceeded deadline, and unresolvable endpoints.
//! None of these are worth retrying.

use thiserror::Error;
use waypoint_core::{NodeId, ValidationError};

/// The graph defeats the chosen algorithm.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgorithmError {
    /// A negative cycle is reachable from the start node.
    #[error("negative cycle detected: reachable from start, distance to '{node}' can still decrease")]
    NegativeCycleDetected {
        /// A node on the cycle or reachable through it.
        node: NodeId,
    },

    /// Dijkstra reached an edge with negative weight.
    #[error("Dijkstra encountered negative edge {from}→{to}={weight}; use Bellman-Ford")]
    NegativeWeightEncountered {
        from: NodeId,
        to: NodeId,
        weight: f64,
    },
}

impl AlgorithmError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NegativeCycleDetected { .. } => "NEGATIVE_CYCLE_DETECTED",
            Self::NegativeWeightEncountered { .. } => "NEGATIVE_WEIGHT_ENCOUNTERED",
        }
    }
}

/// A search ended without producing a path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The algorithm cannot produce a correct answer for this graph.
    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    /// The goal is not reachable from the start.
    #[error("no path from '{start}' to '{goal}'")]
    NotFound { start: NodeId, goal: NodeId },

    /// The deadline passed before the search finished.
    #[error("computation exceeded its deadline of {budget_ms} ms")]
    DeadlineExceeded { budget_ms: u64 },

    /// An endpoint could not be resolved in the graph.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
