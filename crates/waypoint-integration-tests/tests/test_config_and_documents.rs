//! # Configuration and Graph Documents
//!
//! - Service configuration loads from a YAML file and drives the service
//! - Graph documents deserialize from JSON, including isolated nodes
//! - Requests and responses travel as JSON

use std::io::Write;
use std::sync::Arc;

use waypoint_core::{Graph, GraphDocument, RouteRequest};
use waypoint_service::{ConfigError, RouteResponse, RouteStatus, RoutingService, ServiceConfig};

const GRAPH_JSON: &str = r#"{
    "nodes": ["depot", "island"],
    "edges": [
        {"source": "depot", "target": "north", "weight": 3.5},
        {"source": "north", "target": "harbor", "weight": 1.0},
        {"source": "depot", "target": "harbor", "weight": 6.0}
    ]
}"#;

#[tokio::test]
async fn service_built_from_config_file_and_json_graph() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        "retry:\n  max_attempts: 2\ncache:\n  capacity: 16\n  ttl_secs: 60\ndefault_timeout_ms: 5000\nlogging:\n  filter: warn"
    )?;
    let config = ServiceConfig::load(file.path())?;
    assert_eq!(config.retry.max_attempts, 2);
    assert_eq!(config.cache.capacity, 16);

    let document: GraphDocument = serde_json::from_str(GRAPH_JSON)?;
    let graph = Graph::from_document(document)?;
    assert_eq!(graph.node_count(), 4);
    assert!(graph.contains("island"));

    let svc = RoutingService::new(Arc::new(graph), config)?;
    let request: RouteRequest = serde_json::from_str(
        r#"{"request_id": "trip-7", "start": "depot", "goal": "harbor"}"#,
    )?;
    let response = svc.compute_route(request).await;
    assert_eq!(response.status(), RouteStatus::Success);
    assert_eq!(response.cost(), Some(4.5));

    let isolated: RouteRequest = serde_json::from_str(
        r#"{"request_id": "trip-8", "start": "depot", "goal": "island"}"#,
    )?;
    assert_eq!(svc.compute_route(isolated).await.status(), RouteStatus::NotFound);
    Ok(())
}

#[test]
fn invalid_config_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "retry:\n  multiplier: 1.0").unwrap();
    let err = ServiceConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
}

#[test]
fn malformed_graph_document_is_rejected() {
    let document: GraphDocument = serde_json::from_str(
        r#"{"edges": [{"source": "", "target": "b", "weight": 1.0}]}"#,
    )
    .unwrap();
    assert!(Graph::from_document(document).is_err());
}

#[test]
fn graph_document_round_trips() {
    let document: GraphDocument = serde_json::from_str(GRAPH_JSON).unwrap();
    let graph = Graph::from_document(document).unwrap();
    let rebuilt = Graph::from_document(graph.to_document()).unwrap();
    assert_eq!(rebuilt.metadata(), graph.metadata());
    assert_eq!(
        rebuilt.edges().map(|e| e.weight).collect::<Vec<_>>(),
        graph.edges().map(|e| e.weight).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn response_json_round_trips() {
    let graph = Graph::from_document(serde_json::from_str(GRAPH_JSON).unwrap()).unwrap();
    let svc = RoutingService::new(Arc::new(graph), ServiceConfig::default()).unwrap();
    let request: RouteRequest =
        serde_json::from_str(r#"{"request_id": "rt", "start": "depot", "goal": "harbor", "algorithm": "bellman-ford"}"#)
            .unwrap();

    let response = svc.compute_route(request).await;
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains(r#""status":"SUCCESS""#), "{json}");
    assert!(json.contains(r#""algorithm_used":"bellman-ford""#), "{json}");
    let back: RouteResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(back, response);
}

#[test]
fn blank_request_id_is_rejected_on_the_wire() {
    let parsed = serde_json::from_str::<RouteRequest>(
        r#"{"request_id": "  ", "start": "a", "goal": "b"}"#,
    );
    assert!(parsed.is_err());
}
