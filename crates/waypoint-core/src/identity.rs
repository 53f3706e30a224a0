//! # Identifier Newtypes
//!
//! Newtype wrappers for the two identifier namespaces in Waypoint: graph
//! nodes and route requests. Keeping them distinct means a request id can
//! never be looked up as a node, and vice versa.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a graph node.
///
/// Ordering is lexicographic on the underlying string. That order is the
/// tie-breaking order for every algorithm in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap a node id, returning `None` for empty or whitespace-only input.
    pub fn parse(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rejected idempotency key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("request id must be non-empty")]
pub struct RequestIdError;

/// Caller-supplied idempotency key for a route request.
///
/// Two submissions with the same `RequestId` are the same logical attempt
/// and receive the same response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(String);

impl RequestId {
    /// Wrap a caller-supplied key. Empty or whitespace-only keys are rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, RequestIdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RequestIdError);
        }
        Ok(Self(id))
    }

    /// Generate a fresh random key for callers without their own.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RequestId {
    type Error = RequestIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
