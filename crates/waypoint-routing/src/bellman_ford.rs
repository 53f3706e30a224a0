//! # Bellman-Ford
//!
//! Edge relaxation for graphs with arbitrary finite weights.
//!
//! Runs at most |V|−1 passes over every edge in a fixed order (source id,
//! then target id). A pass that changes nothing ends the relaxation early.
//! If all |V|−1 passes changed something, one more detection pass runs:
//! any edge that can still be relaxed proves a negative cycle reachable
//! from the start, and the search fails with
//! [`AlgorithmError::NegativeCycleDetected`] naming that edge's target.
//!
//! Negative cycles not reachable from the start do not affect the result.

use tracing::trace;
use waypoint_core::{AlgorithmKind, Graph, NodeIndex};

use crate::deadline::{DeadlineCheck, SearchOptions};
use crate::error::{AlgorithmError, SearchError};
use crate::path::{reconstruct, SearchStats, ShortestPath};
use crate::ShortestPathAlgorithm;

/// Bellman-Ford with early termination and negative-cycle detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellmanFord;

impl ShortestPathAlgorithm for BellmanFord {
    const KIND: AlgorithmKind = AlgorithmKind::BellmanFord;

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
        let mut stats = SearchStats::default();
        let mut check = DeadlineCheck::new(options);
        dist[start.index()] = 0.0;

        let mut converged = false;
        for _ in 1..n {
            stats.passes += 1;
            let mut changed = false;
            for u in graph.node_indices() {
                check.tick()?;
                let base = dist[u.index()];
                if base == f64::INFINITY {
                    continue;
                }
                for &(v, weight) in graph.out_edges(u) {
                    let candidate = base + weight;
                    if candidate < dist[v.index()] {
                        dist[v.index()] = candidate;
                        pred[v.index()] = Some(u);
                        stats.relaxations += 1;
                        changed = true;
                    }
                }
            }
            if !changed {
                converged = true;
                break;
            }
        }

        if !converged {
            for u in graph.node_indices() {
                check.tick()?;
                let base = dist[u.index()];
                if base == f64::INFINITY {
                    continue;
                }
                if let Some(&(v, _)) = graph
                    .out_edges(u)
                    .iter()
                    .find(|&&(v, weight)| base + weight < dist[v.index()])
                {
                    return Err(AlgorithmError::NegativeCycleDetected {
                        node: graph.node(v).clone(),
                    }
                    .into());
                }
            }
        }

        stats.settled = dist.iter().filter(|d| d.is_finite()).count() as u64;
        let not_found = || SearchError::NotFound {
            start: graph.node(start).clone(),
            goal: graph.node(goal).clone(),
        };
        if !dist[goal.index()].is_finite() {
            return Err(not_found());
        }
        let path = reconstruct(graph, &pred, start, goal).ok_or_else(not_found)?;
        trace!(
            passes = stats.passes,
            relaxations = stats.relaxations,
            hops = path.len() - 1,
            "bellman-ford finished"
        );
        Ok(ShortestPath {
            path,
            cost: dist[goal.index()],
            algorithm: Self::KIND,
            stats,
        })
    }
}
