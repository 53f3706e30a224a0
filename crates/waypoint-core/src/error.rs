//! # Error Types: Graph Construction
//!
//! Errors raised while turning an ingested edge list into a [`Graph`].
//! Request-level precondition failures live in [`crate::validation`].
//!
//! [`Graph`]: crate::Graph

use thiserror::Error;

/// The ingested edge data cannot form a valid graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedGraphError {
    /// A node id is empty or consists only of whitespace.
    #[error("node id must be non-empty (edge #{edge_index}: {position} endpoint)")]
    EmptyNodeId {
        /// Position of the offending edge in the input list.
        edge_index: usize,
        /// Which endpoint was empty ("source", "target" or "declared").
        position: &'static str,
    },

    /// An edge weight is NaN or infinite.
    #[error("edge {from} -> {to} has non-finite weight {weight}")]
    NonFiniteWeight {
        /// Source node id.
        from: String,
        /// Target node id.
        to: String,
        /// The rejected weight.
        weight: f64,
    },

    /// The absolute edge weights sum past the `f64` range, so some path
    /// costs would not be representable.
    #[error("sum of absolute edge weights overflows f64; path costs would be unbounded")]
    CostOverflow,

    /// The graph has more nodes than a `u32` index can address.
    #[error("graph has {count} nodes; at most {max} are addressable")]
    TooManyNodes {
        /// Number of distinct nodes ingested.
        count: usize,
        /// Largest supported node count.
        max: usize,
    },
}
