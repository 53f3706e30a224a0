//! # waypoint-routing: Shortest-Path Algorithms
//!
//! Two single-source shortest-path algorithms behind one contract, and the
//! pure function that picks between them:
//!
//! - **Dijkstra** ([`dijkstra`]): priority-queue search for non-negative
//!   weights. A node is finalized when it is *extracted* from the queue with
//!   the minimum tentative distance, never when it is first discovered.
//!   Negative edges are rejected if encountered.
//!
//! - **Bellman-Ford** ([`bellman_ford`]): |V|−1 relaxation passes in a fixed
//!   edge order, then one detection pass. A still-relaxable edge means a
//!   negative cycle is reachable from the start.
//!
//! - **Selection** ([`selector`]): Dijkstra when the graph has no negative
//!   weights, Bellman-Ford otherwise. Forcing Dijkstra onto negative weights
//!   is a validation error.
//!
//! - **Deadlines** ([`deadline`]): both algorithms check the clock every
//!   `check_interval` inner iterations so a timeout bounds the overrun.
//!
//! All per-search state (distances, predecessors, the finalized set) lives
//! in `Vec`s allocated by one call and indexed by [`NodeIndex`]. Nothing is
//! shared between searches.

pub mod bellman_ford;
pub mod deadline;
pub mod dijkstra;
pub mod error;
pub mod path;
pub mod selector;

pub use bellman_ford::BellmanFord;
pub use deadline::{Deadline, SearchOptions, DEFAULT_CHECK_INTERVAL};
pub use dijkstra::Dijkstra;
pub use error::{AlgorithmError, SearchError};
pub use path::{PathViolation, SearchStats, ShortestPath};
pub use selector::{select_algorithm, Selection, SelectionReason};

use waypoint_core::{AlgorithmKind, Graph, NodeIndex, NodeRole, ValidationError};

/// Common contract of the two search algorithms.
pub trait ShortestPathAlgorithm {
    /// Which algorithm this is.
    const KIND: AlgorithmKind;

    /// Cheapest path from `start` to `goal`. `start != goal`.
    fn search(
        &self,
        graph: &Graph,
        start: NodeIndex,
        goal: NodeIndex,
        options: &SearchOptions,
    ) -> Result<ShortestPath, SearchError>;
}

/// Run `algorithm` for the node ids `start` and `goal`.
///
/// A self-route (`start == goal`) resolves to `[start]` with cost 0 without
/// running a search.
pub fn shortest_path(
    algorithm: AlgorithmKind,
    graph: &Graph,
    start: &str,
    goal: &str,
    options: &SearchOptions,
) -> Result<ShortestPath, SearchError> {
    let from = resolve(graph, start, NodeRole::Start)?;
    let to = resolve(graph, goal, NodeRole::Goal)?;
    if from == to {
        return Ok(ShortestPath::trivial(graph.node(from).clone(), algorithm));
    }
    match algorithm {
        AlgorithmKind::Dijkstra => Dijkstra.search(graph, from, to, options),
        AlgorithmKind::BellmanFord => BellmanFord.search(graph, from, to, options),
    }
}

fn resolve(graph: &Graph, node: &str, role: NodeRole) -> Result<NodeIndex, SearchError> {
    graph.node_index(node).ok_or_else(|| {
        SearchError::Validation(ValidationError::NodeNotFound {
            node: node.to_string(),
            role,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::EdgeSpec;

    fn graph() -> Graph {
        Graph::from_edges([EdgeSpec::new("A", "B", 1.0), EdgeSpec::new("B", "C", -1.0)]).unwrap()
    }

    #[test]
    fn self_route_is_trivial_for_both_algorithms() {
        let g = graph();
        for kind in [AlgorithmKind::Dijkstra, AlgorithmKind::BellmanFord] {
            let p = shortest_path(kind, &g, "B", "B", &SearchOptions::default()).unwrap();
            assert_eq!(p.path.len(), 1);
            assert_eq!(p.path[0].as_str(), "B");
            assert_eq!(p.cost, 0.0);
            assert_eq!(p.algorithm, kind);
        }
    }

    #[test]
    fn unknown_nodes_reported_with_role() {
        let g = graph();
        let err =
            shortest_path(AlgorithmKind::BellmanFord, &g, "Q", "A", &SearchOptions::default())
                .unwrap_err();
        assert_eq!(
            err,
            SearchError::Validation(ValidationError::NodeNotFound {
                node: "Q".into(),
                role: NodeRole::Start
            })
        );
    }

    #[test]
    fn dispatch_uses_requested_algorithm() {
        let g = graph();
        let p = shortest_path(AlgorithmKind::BellmanFord, &g, "A", "C", &SearchOptions::default())
            .unwrap();
        assert_eq!(p.algorithm, AlgorithmKind::BellmanFord);
        assert_eq!(p.cost, 0.0);
    }

    #[test]
    fn shortest_path_serializes_with_kebab_case_algorithm() {
        let g = graph();
        let p = shortest_path(AlgorithmKind::BellmanFord, &g, "A", "B", &SearchOptions::default())
            .unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["path"], serde_json::json!(["A", "B"]));
        assert_eq!(json["algorithm"], "bellman-ford");
        let back: ShortestPath = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
