//! # Route Responses
//!
//! [`RouteResponse`] is the only output of
//! [`RoutingService::compute_route`](crate::RoutingService::compute_route).
//! Its fields are private. The two constructors guarantee that a SUCCESS
//! response carries a path and cost and no error, and that every other
//! status carries an error detail and neither path nor cost. Deserialization
//! re-checks the same shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use waypoint_core::{AlgorithmKind, NodeId, RequestId};
use waypoint_routing::ShortestPath;

/// Terminal outcome of a route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Success,
    ValidationError,
    NotFound,
    AlgorithmError,
    Timeout,
    Failure,
}

impl RouteStatus {
    /// Wire name, also used as a metric label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::AlgorithmError => "ALGORITHM_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Failure => "FAILURE",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable kind plus human-readable message of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable code, e.g. `NODE_NOT_FOUND` or `NEGATIVE_CYCLE_DETECTED`.
    pub kind: String,
    pub message: String,
}

/// A deserialized response violates the success/failure shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseShapeError {
    #[error("SUCCESS response must carry a path and cost and no error")]
    IncompleteSuccess,
    #[error("{status} response must carry an error and no path or cost")]
    IncompleteFailure { status: RouteStatus },
}

/// Result of one route request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResponseFields")]
pub struct RouteResponse {
    request_id: RequestId,
    status: RouteStatus,
    path: Option<Vec<NodeId>>,
    cost: Option<f64>,
    algorithm_used: Option<AlgorithmKind>,
    compute_time_ms: f64,
    attempt_count: u32,
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ResponseFields {
    request_id: RequestId,
    status: RouteStatus,
    path: Option<Vec<NodeId>>,
    cost: Option<f64>,
    algorithm_used: Option<AlgorithmKind>,
    compute_time_ms: f64,
    attempt_count: u32,
    error: Option<ErrorDetail>,
}

impl TryFrom<ResponseFields> for RouteResponse {
    type Error = ResponseShapeError;

    fn try_from(f: ResponseFields) -> Result<Self, Self::Error> {
        let has_result = f.path.is_some() && f.cost.is_some();
        let has_none = f.path.is_none() && f.cost.is_none();
        match f.status {
            RouteStatus::Success if !has_result || f.error.is_some() => {
                return Err(ResponseShapeError::IncompleteSuccess)
            }
            status if !status.is_success() && (!has_none || f.error.is_none()) => {
                return Err(ResponseShapeError::IncompleteFailure { status })
            }
            _ => {}
        }
        Ok(Self {
            request_id: f.request_id,
            status: f.status,
            path: f.path,
            cost: f.cost,
            algorithm_used: f.algorithm_used,
            compute_time_ms: f.compute_time_ms,
            attempt_count: f.attempt_count,
            error: f.error,
        })
    }
}

impl RouteResponse {
    /// A SUCCESS response for `path`.
    pub fn success(
        request_id: RequestId,
        path: ShortestPath,
        compute_time_ms: f64,
        attempt_count: u32,
    ) -> Self {
        Self {
            request_id,
            status: RouteStatus::Success,
            path: Some(path.path),
            cost: Some(path.cost),
            algorithm_used: Some(path.algorithm),
            compute_time_ms,
            attempt_count,
            error: None,
        }
    }

    /// A non-SUCCESS response. A `Success` status is coerced to `Failure`
    /// since a success without a path cannot exist.
    pub fn failed(
        request_id: RequestId,
        status: RouteStatus,
        error: ErrorDetail,
        algorithm_used: Option<AlgorithmKind>,
        compute_time_ms: f64,
        attempt_count: u32,
    ) -> Self {
        let status = if status.is_success() {
            RouteStatus::Failure
        } else {
            status
        };
        Self {
            request_id,
            status,
            path: None,
            cost: None,
            algorithm_used,
            compute_time_ms,
            attempt_count,
            error: Some(error),
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn status(&self) -> RouteStatus {
        self.status
    }

    pub fn path(&self) -> Option<&[NodeId]> {
        self.path.as_deref()
    }

    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    pub fn algorithm_used(&self) -> Option<AlgorithmKind> {
        self.algorithm_used
    }

    pub fn compute_time_ms(&self) -> f64 {
        self.compute_time_ms
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }
}
