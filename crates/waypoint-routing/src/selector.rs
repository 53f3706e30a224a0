//! # Algorithm Selection
//!
//! Pure choice between Dijkstra and Bellman-Ford from graph metadata and an
//! optional caller override.

use serde::Serialize;
use waypoint_core::{AlgorithmKind, GraphMetadata, ValidationError};

/// Why an algorithm was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// Picked from the graph's weights.
    Automatic,
    /// Requested by the caller.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub algorithm: AlgorithmKind,
    pub reason: SelectionReason,
}

/// Pick the algorithm for a graph.
///
/// | override      | negative weights | result                        |
/// |---------------|------------------|-------------------------------|
/// | none          | no               | Dijkstra                      |
/// | none          | yes              | Bellman-Ford                  |
/// | Bellman-Ford  | any              | Bellman-Ford                  |
/// | Dijkstra      | no               | Dijkstra                      |
/// | Dijkstra      | yes              | `NegativeWeightPrecondition`  |
pub fn select_algorithm(
    metadata: &GraphMetadata,
    forced: Option<AlgorithmKind>,
) -> Result<Selection, ValidationError> {
    match forced {
        Some(algorithm) => {
            if metadata.has_negative_weight && !algorithm.supports_negative_weights() {
                return Err(ValidationError::negative_weights_from_metadata(metadata));
            }
            Ok(Selection {
                algorithm,
                reason: SelectionReason::Forced,
            })
        }
        None => {
            let algorithm = if metadata.has_negative_weight {
                AlgorithmKind::BellmanFord
            } else {
                AlgorithmKind::Dijkstra
            };
            Ok(Selection {
                algorithm,
                reason: SelectionReason::Automatic,
            })
        }
    }
}
