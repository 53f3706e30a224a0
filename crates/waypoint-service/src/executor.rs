//! Execution seam between the service and the search algorithms.
//!
//! The service hands an [`ExecutionPlan`] to a [`RouteExecutor`] on Tokio's
//! blocking pool. [`AlgorithmExecutor`] runs the selected algorithm. Other
//! executors can wrap it to inject environmental failures, reported as
//! [`ExecutionError::Transient`] and retried by the service.

use waypoint_core::{AlgorithmKind, Graph};
use waypoint_routing::{shortest_path, SearchOptions, ShortestPath};

use crate::error::ExecutionError;

/// Everything one execution attempt needs.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub algorithm: AlgorithmKind,
    pub start: String,
    pub goal: String,
    pub options: SearchOptions,
}

/// Runs a planned search against a graph. Called from a blocking thread.
pub trait RouteExecutor: Send + Sync {
    fn execute(&self, graph: &Graph, plan: &ExecutionPlan) -> Result<ShortestPath, ExecutionError>;
}

impl<F> RouteExecutor for F
where
    F: Fn(&Graph, &ExecutionPlan) -> Result<ShortestPath, ExecutionError> + Send + Sync,
{
    fn execute(&self, graph: &Graph, plan: &ExecutionPlan) -> Result<ShortestPath, ExecutionError> {
        self(graph, plan)
    }
}

/// Runs the planned algorithm directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlgorithmExecutor;

impl RouteExecutor for AlgorithmExecutor {
    fn execute(&self, graph: &Graph, plan: &ExecutionPlan) -> Result<ShortestPath, ExecutionError> {
        shortest_path(plan.algorithm, graph, &plan.start, &plan.goal, &plan.options)
            .map_err(ExecutionError::Search)
    }
}
