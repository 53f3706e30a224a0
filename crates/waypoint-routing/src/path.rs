//! # Shortest Paths
//!
//! [`ShortestPath`] is the result of a successful search. Its invariants:
//! the path starts at the start node, ends at the goal, every consecutive
//! pair is an edge of the graph, and `cost` is the sum of those edge
//! weights. [`ShortestPath::verify`] checks all of them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use waypoint_core::{AlgorithmKind, Graph, NodeId, NodeIndex};

/// Relative tolerance for comparing a reported cost with the recomputed sum.
const COST_TOLERANCE: f64 = 1e-9;

/// Work counters of one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Edge relaxations that improved a distance.
    pub relaxations: u64,
    /// Nodes finalized (Dijkstra) or reached (Bellman-Ford).
    pub settled: u64,
    /// Full relaxation passes (Bellman-Ford only).
    pub passes: u64,
}

/// A cheapest path and its total cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortestPath {
    pub path: Vec<NodeId>,
    pub cost: f64,
    pub algorithm: AlgorithmKind,
    #[serde(default)]
    pub stats: SearchStats,
}

/// A [`ShortestPath`] does not describe a real path of a graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathViolation {
    #[error("path is empty")]
    Empty,

    #[error("path starts at '{actual}', expected '{expected}'")]
    WrongStart { expected: String, actual: NodeId },

    #[error("path ends at '{actual}', expected '{expected}'")]
    WrongGoal { expected: String, actual: NodeId },

    #[error("path uses '{from}'→'{to}', which is not an edge of the graph")]
    MissingEdge { from: NodeId, to: NodeId },

    #[error("reported cost {reported} differs from edge sum {computed}")]
    CostMismatch { reported: f64, computed: f64 },
}

impl ShortestPath {
    /// The zero-length path of a self-route.
    pub fn trivial(node: NodeId, algorithm: AlgorithmKind) -> Self {
        Self {
            path: vec![node],
            cost: 0.0,
            algorithm,
            stats: SearchStats::default(),
        }
    }

    /// Number of edges on the path.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Check that this path is a real `start`→`goal` path of `graph` and
    /// that `cost` matches its edge weights.
    pub fn verify(&self, graph: &Graph, start: &str, goal: &str) -> Result<(), PathViolation> {
        let (first, last) = match (self.path.first(), self.path.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(PathViolation::Empty),
        };
        if first.as_str() != start {
            return Err(PathViolation::WrongStart {
                expected: start.to_string(),
                actual: first.clone(),
            });
        }
        if last.as_str() != goal {
            return Err(PathViolation::WrongGoal {
                expected: goal.to_string(),
                actual: last.clone(),
            });
        }

        let mut computed = 0.0;
        for pair in self.path.windows(2) {
            let weight = graph
                .edge_weight(pair[0].as_str(), pair[1].as_str())
                .ok_or_else(|| PathViolation::MissingEdge {
                    from: pair[0].clone(),
                    to: pair[1].clone(),
                })?;
            computed += weight;
        }

        let scale = computed.abs().max(self.cost.abs()).max(1.0);
        if (computed - self.cost).abs() > COST_TOLERANCE * scale {
            return Err(PathViolation::CostMismatch {
                reported: self.cost,
                computed,
            });
        }
        Ok(())
    }
}

/// Walk `predecessors` back from `goal` to `start`.
///
/// Returns `None` if the chain is broken or longer than the node count.
pub(crate) fn reconstruct(
    graph: &Graph,
    predecessors: &[Option<NodeIndex>],
    start: NodeIndex,
    goal: NodeIndex,
) -> Option<Vec<NodeId>> {
    let mut reversed = vec![goal];
    let mut current = goal;
    while current != start {
        if reversed.len() > graph.node_count() {
            return None;
        }
        current = predecessors.get(current.index()).copied().flatten()?;
        reversed.push(current);
    }
    Some(reversed.into_iter().rev().map(|i| graph.node(i).clone()).collect())
}
