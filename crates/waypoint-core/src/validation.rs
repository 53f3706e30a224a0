//! # Request Validation
//!
//! Precondition checks run against a [`Graph`] and a [`RouteRequest`]
//! before any algorithm executes. A request that fails here never reaches
//! the search code.
//!
//! ## Checks, in order
//!
//! 1. The graph has at least one node.
//! 2. The graph is within the configured [`GraphLimits`].
//! 3. The start node exists.
//! 4. The goal node exists.
//! 5. A forced Dijkstra is only allowed on a graph without negative weights.
//!
//! Check 5 closes the hole where Dijkstra runs on negative edges and returns
//! a plausible but wrong cost. Start == goal passes validation and resolves
//! to the trivial path.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MalformedGraphError;
use crate::graph::{Graph, GraphMetadata};
use crate::request::{AlgorithmKind, RouteRequest};

/// Number of sample negative edges quoted in a precondition message.
const NEGATIVE_EDGE_SAMPLES: usize = 3;

/// Which endpoint of a request a node id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Start,
    Goal,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Goal => write!(f, "goal"),
        }
    }
}

/// A route request cannot be served against this graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The graph has no nodes.
    #[error("graph has no nodes")]
    EmptyGraph,

    /// The graph exceeds the configured size limits.
    #[error(
        "graph has {node_count} nodes and {edge_count} edges; limits are {max_nodes} nodes and {max_edges} edges"
    )]
    GraphTooLarge {
        node_count: usize,
        edge_count: usize,
        max_nodes: usize,
        max_edges: usize,
    },

    /// The start or goal node is not in the graph.
    #[error("{role} node '{node}' not found in graph")]
    NodeNotFound {
        /// The missing node id, as supplied by the caller.
        node: String,
        /// Whether it was the start or the goal.
        role: NodeRole,
    },

    /// Dijkstra was forced onto a graph containing negative weights.
    #[error(
        "Dijkstra requires non-negative edge weights; graph has {negative_edge_count} negative-weight edge(s){}",
        describe_samples(.samples, .negative_edge_count)
    )]
    NegativeWeightPrecondition {
        /// Total number of negative edges.
        negative_edge_count: usize,
        /// Up to three rendered sample edges, e.g. `D→F=-3`.
        samples: Vec<String>,
    },

    /// The ingested edge data did not form a valid graph.
    #[error("malformed graph: {0}")]
    MalformedGraph(#[from] MalformedGraphError),
}

impl ValidationError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyGraph => "EMPTY_GRAPH",
            Self::GraphTooLarge { .. } => "GRAPH_TOO_LARGE",
            Self::NodeNotFound { .. } => "NODE_NOT_FOUND",
            Self::NegativeWeightPrecondition { .. } => "NEGATIVE_WEIGHT_PRECONDITION",
            Self::MalformedGraph(_) => "MALFORMED_GRAPH",
        }
    }

    /// Precondition failure quoting sample negative edges from `graph`.
    pub fn negative_weights(graph: &Graph) -> Self {
        Self::NegativeWeightPrecondition {
            negative_edge_count: graph.metadata().negative_edge_count,
            samples: graph
                .negative_edges()
                .into_iter()
                .take(NEGATIVE_EDGE_SAMPLES)
                .map(|e| format!("{}→{}={}", e.source, e.target, e.weight))
                .collect(),
        }
    }

    /// Precondition failure built from metadata alone (no edge samples).
    pub fn negative_weights_from_metadata(metadata: &GraphMetadata) -> Self {
        Self::NegativeWeightPrecondition {
            negative_edge_count: metadata.negative_edge_count,
            samples: Vec::new(),
        }
    }
}

fn describe_samples(samples: &[String], total: &usize) -> String {
    if samples.is_empty() {
        return String::new();
    }
    let mut out = format!(": {}", samples.join(", "));
    if *total > samples.len() {
        out.push_str(&format!(" ... and {} more", total - samples.len()));
    }
    out
}

/// Upper bounds on the graphs the engine will search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLimits {
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    #[serde(default = "default_max_edges")]
    pub max_edges: usize,
}

fn default_max_nodes() -> usize {
    10_000
}

fn default_max_edges() -> usize {
    100_000
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            max_edges: default_max_edges(),
        }
    }
}

/// Precondition checker for route requests.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: GraphLimits,
}

impl Validator {
    pub fn new(limits: GraphLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &GraphLimits {
        &self.limits
    }

    /// Check that `request` can be served against `graph`.
    pub fn validate(&self, graph: &Graph, request: &RouteRequest) -> Result<(), ValidationError> {
        let meta = graph.metadata();
        if meta.node_count == 0 {
            return Err(ValidationError::EmptyGraph);
        }
        if meta.node_count > self.limits.max_nodes || meta.edge_count > self.limits.max_edges {
            return Err(ValidationError::GraphTooLarge {
                node_count: meta.node_count,
                edge_count: meta.edge_count,
                max_nodes: self.limits.max_nodes,
                max_edges: self.limits.max_edges,
            });
        }
        if !graph.contains(&request.start) {
            return Err(ValidationError::NodeNotFound {
                node: request.start.clone(),
                role: NodeRole::Start,
            });
        }
        if !graph.contains(&request.goal) {
            return Err(ValidationError::NodeNotFound {
                node: request.goal.clone(),
                role: NodeRole::Goal,
            });
        }
        if request.algorithm == Some(AlgorithmKind::Dijkstra) && meta.has_negative_weight {
            return Err(ValidationError::negative_weights(graph));
        }
        Ok(())
    }
}
