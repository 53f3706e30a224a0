//! # Dijkstra
//!
//! Binary-heap shortest path for graphs with non-negative weights.
//!
//! A node is finalized only when it is popped from the frontier with its
//! minimum tentative distance. Stale frontier entries (a cheaper entry for
//! the same node was pushed later) are skipped on pop. Finalized nodes are
//! never relaxed again. The search stops as soon as the goal is finalized.
//!
//! Frontier ties on cost are broken by the smaller node index. Indices
//! follow node id order, so ties resolve lexicographically by id.
//!
//! Dijkstra is only correct when every weight is non-negative. If the
//! search meets a negative edge it fails with
//! [`AlgorithmError::NegativeWeightEncountered`] instead of returning a
//! possibly wrong cost.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::trace;
use waypoint_core::{AlgorithmKind, Graph, NodeIndex};

use crate::deadline::{DeadlineCheck, SearchOptions};
use crate::error::{AlgorithmError, SearchError};
use crate::path::{reconstruct, SearchStats, ShortestPath};
use crate::ShortestPathAlgorithm;

/// Dijkstra's algorithm with finalize-on-extract semantics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dijkstra;

/// Frontier entry. Ordered so that `BinaryHeap` pops the lowest cost first,
/// then the lowest node index.
#[derive(Debug, Clone, Copy)]
struct Frontier {
    cost: f64,
    node: NodeIndex,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl ShortestPathAlgorithm for Dijkstra {
    const KIND: AlgorithmKind = AlgorithmKind::Dijkstra;

    fn search(
        &self,
        graph: &Graph,
        start: NodeIndex,
        goal: NodeIndex,
        options: &SearchOptions,
    ) -> Result<ShortestPath, SearchError> {
        let n = graph.node_count();
        let mut dist = vec![f64::INFINITY; n];
        let mut pred: Vec<Option<NodeIndex>> = vec![None; n];
        let mut finalized = vec![false; n];
        let mut stats = SearchStats::default();
        let mut check = DeadlineCheck::new(options);

        let mut frontier = BinaryHeap::new();
        dist[start.index()] = 0.0;
        frontier.push(Frontier {
            cost: 0.0,
            node: start,
        });

        while let Some(Frontier { cost, node }) = frontier.pop() {
            check.tick()?;
            let u = node.index();
            if finalized[u] || cost > dist[u] {
                continue;
            }
            finalized[u] = true;
            stats.settled += 1;
            if node == goal {
                break;
            }

            for &(target, weight) in graph.out_edges(node) {
                if weight < 0.0 {
                    return Err(AlgorithmError::NegativeWeightEncountered {
                        from: graph.node(node).clone(),
                        to: graph.node(target).clone(),
                        weight,
                    }
                    .into());
                }
                let v = target.index();
                if finalized[v] {
                    continue;
                }
                let candidate = cost + weight;
                if candidate < dist[v] {
                    dist[v] = candidate;
                    pred[v] = Some(node);
                    stats.relaxations += 1;
                    frontier.push(Frontier {
                        cost: candidate,
                        node: target,
                    });
                }
            }
        }

        if !finalized[goal.index()] {
            return Err(SearchError::NotFound {
                start: graph.node(start).clone(),
                goal: graph.node(goal).clone(),
            });
        }

        let path = reconstruct(graph, &pred, start, goal).ok_or_else(|| {
            SearchError::NotFound {
                start: graph.node(start).clone(),
                goal: graph.node(goal).clone(),
            }
        })?;
        trace!(
            settled = stats.settled,
            relaxations = stats.relaxations,
            hops = path.len() - 1,
            "dijkstra finished"
        );
        Ok(ShortestPath {
            path,
            cost: dist[goal.index()],
            algorithm: Self::KIND,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::deadline::Deadline;
    use waypoint_core::EdgeSpec;

    fn graph(edges: &[(&str, &str, f64)]) -> Graph {
        Graph::from_edges(edges.iter().map(|&(s, t, w)| EdgeSpec::new(s, t, w))).unwrap()
    }

    fn run(g: &Graph, start: &str, goal: &str) -> Result<ShortestPath, SearchError> {
        Dijkstra.search(
            g,
            g.node_index(start).unwrap(),
            g.node_index(goal).unwrap(),
            &SearchOptions::default(),
        )
    }

    fn names(p: &ShortestPath) -> Vec<&str> {
        p.path.iter().map(|n| n.as_str()).collect()
    }

    #[test]
    fn finds_cheapest_path() {
        let g = graph(&[
            ("A", "B", 4.0),
            ("A", "C", 1.0),
            ("C", "B", 2.0),
            ("B", "D", 1.0),
            ("C", "D", 5.0),
        ]);
        let p = run(&g, "A", "D").unwrap();
        assert_eq!(names(&p), ["A", "C", "B", "D"]);
        assert_eq!(p.cost, 4.0);
        assert_eq!(p.algorithm, AlgorithmKind::Dijkstra);
        p.verify(&g, "A", "D").unwrap();
    }

    #[test]
    fn later_cheaper_discovery_wins() {
        // B is discovered first via the expensive direct edge; it must not be
        // finalized until the cheaper route through C has been considered.
        let g = graph(&[("A", "B", 10.0), ("A", "C", 1.0), ("C", "B", 1.0)]);
        let p = run(&g, "A", "B").unwrap();
        assert_eq!(names(&p), ["A", "C", "B"]);
        assert_eq!(p.cost, 2.0);
    }

    #[test]
    fn ties_resolve_by_node_id() {
        let g = graph(&[
            ("S", "M", 1.0),
            ("S", "K", 1.0),
            ("M", "T", 1.0),
            ("K", "T", 1.0),
        ]);
        let p = run(&g, "S", "T").unwrap();
        assert_eq!(names(&p), ["S", "K", "T"]);
    }

    #[test]
    fn zero_weight_cycle_terminates() {
        let g = graph(&[("A", "B", 0.0), ("B", "A", 0.0), ("B", "C", 2.0)]);
        let p = run(&g, "A", "C").unwrap();
        assert_eq!(names(&p), ["A", "B", "C"]);
        assert_eq!(p.cost, 2.0);
    }

    #[test]
    fn unreachable_goal_is_not_found() {
        let g = graph(&[("A", "B", 1.0), ("C", "D", 1.0)]);
        assert!(matches!(
            run(&g, "A", "D"),
            Err(SearchError::NotFound { .. })
        ));
    }

    #[test]
    fn negative_edge_rejected_when_reached() {
        let g = graph(&[("A", "B", 1.0), ("B", "C", -2.0)]);
        let err = run(&g, "A", "C").unwrap_err();
        assert!(matches!(
            err,
            SearchError::Algorithm(AlgorithmError::NegativeWeightEncountered { weight, .. })
                if weight == -2.0
        ));
    }

    #[test]
    fn expired_deadline_stops_search() {
        let g = graph(&[("A", "B", 1.0)]);
        let options = SearchOptions::with_deadline(Deadline::after(Duration::ZERO));
        let err = Dijkstra
            .search(
                &g,
                g.node_index("A").unwrap(),
                g.node_index("B").unwrap(),
                &options,
            )
            .unwrap_err();
        assert!(matches!(err, SearchError::DeadlineExceeded { .. }));
    }

    #[test]
    fn frontier_pops_lowest_cost_then_lowest_index() {
        let g = graph(&[("A", "B", 1.0), ("B", "C", 1.0)]);
        let [a, b, c] = ["A", "B", "C"].map(|n| g.node_index(n).unwrap());
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { cost: 2.0, node: a });
        heap.push(Frontier { cost: 1.0, node: c });
        heap.push(Frontier { cost: 1.0, node: b });
        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|f| f.node).collect();
        assert_eq!(order, vec![b, c, a]);
    }
}
