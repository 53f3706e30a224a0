//! # waypoint-core: Foundational Types for Waypoint
//!
//! This crate is the leaf of the Waypoint workspace. It defines the graph the
//! routing engine searches, the identifiers that flow through every request,
//! and the precondition checks run before any algorithm executes.
//!
//! ## Key Design Principles
//!
//! 1. **Immutable graph.** A [`Graph`] is built once from an edge list and
//!    never mutated. It is `Send + Sync` and shared behind an `Arc` by every
//!    concurrent request.
//!
//! 2. **Dense, ordered node indices.** Nodes are interned in ascending
//!    lexicographic order of their id, so "lowest index" and "lowest id"
//!    are the same tie-breaking rule everywhere.
//!
//! 3. **Metadata computed at construction.** `has_negative_weight` is known
//!    in O(1) after an O(E) build pass. Negative-cycle existence is not
//!    precomputed because it depends on the start node.
//!
//! 4. **Validation before execution.** [`Validator`] rejects requests that
//!    would force Dijkstra onto negative weights. That is the one way to get
//!    a silently wrong shortest path.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `waypoint-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod graph;
pub mod identity;
pub mod request;
pub mod validation;

// Re-export primary types for ergonomic imports.
pub use error::MalformedGraphError;
pub use graph::{EdgeRef, EdgeSpec, Graph, GraphDocument, GraphMetadata, NodeIndex};
pub use identity::{NodeId, RequestId, RequestIdError};
pub use request::{AlgorithmKind, RouteRequest};
pub use validation::{GraphLimits, NodeRole, ValidationError, Validator};
