//! # Service Errors
//!
//! [`RouteError`] is the terminal failure of one request. It never escapes
//! `compute_route`: each variant maps to a [`RouteStatus`] and is rendered
//! into the response's [`ErrorDetail`].
//!
//! [`ExecutionError`] is what a single execution attempt can report. Only
//! its `Transient` variant is retried.

use thiserror::Error;
use waypoint_core::{NodeId, ValidationError};
use waypoint_routing::{AlgorithmError, SearchError};

use crate::response::{ErrorDetail, RouteStatus};

/// Why a route request did not succeed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no path from '{start}' to '{goal}'")]
    NotFound { start: NodeId, goal: NodeId },

    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    #[error("route computation exceeded its deadline of {budget_ms} ms")]
    Timeout { budget_ms: u64 },

    #[error("route computation failed after {attempts} attempt(s): {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl RouteError {
    /// Response status for this error.
    pub fn status(&self) -> RouteStatus {
        match self {
            Self::Validation(_) => RouteStatus::ValidationError,
            Self::NotFound { .. } => RouteStatus::NotFound,
            Self::Algorithm(_) => RouteStatus::AlgorithmError,
            Self::Timeout { .. } => RouteStatus::Timeout,
            Self::RetriesExhausted { .. } => RouteStatus::Failure,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Algorithm(e) => e.code(),
            Self::Timeout { .. } => "TIMEOUT",
            Self::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            kind: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<SearchError> for RouteError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Algorithm(e) => Self::Algorithm(e),
            SearchError::NotFound { start, goal } => Self::NotFound { start, goal },
            SearchError::DeadlineExceeded { budget_ms } => Self::Timeout { budget_ms },
            SearchError::Validation(e) => Self::Validation(e),
        }
    }
}

/// Failure of one execution attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// Deterministic outcome of the search. Never retried.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Environmental failure worth retrying.
    #[error("transient execution failure: {0}")]
    Transient(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::NodeRole;

    #[test]
    fn statuses_and_codes() {
        let cases = [
            (
                RouteError::Validation(ValidationError::EmptyGraph),
                RouteStatus::ValidationError,
                "EMPTY_GRAPH",
            ),
            (
                RouteError::Timeout { budget_ms: 5 },
                RouteStatus::Timeout,
                "TIMEOUT",
            ),
            (
                RouteError::RetriesExhausted {
                    attempts: 3,
                    last_error: "busy".into(),
                },
                RouteStatus::Failure,
                "RETRIES_EXHAUSTED",
            ),
            (
                RouteError::Algorithm(AlgorithmError::NegativeCycleDetected {
                    node: NodeId::parse("C").unwrap(),
                }),
                RouteStatus::AlgorithmError,
                "NEGATIVE_CYCLE_DETECTED",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
            assert_eq!(err.detail().kind, code);
        }
    }

    #[test]
    fn search_errors_map_to_route_errors() {
        let err: RouteError = SearchError::DeadlineExceeded { budget_ms: 10 }.into();
        assert_eq!(err, RouteError::Timeout { budget_ms: 10 });

        let err: RouteError = SearchError::Validation(ValidationError::NodeNotFound {
            node: "Z".into(),
            role: NodeRole::Goal,
        })
        .into();
        assert_eq!(err.status(), RouteStatus::ValidationError);
        assert!(err.detail().message.contains("'Z'"));
    }
}
