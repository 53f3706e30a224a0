//! # Graph: Immutable Weighted Digraph
//!
//! The adjacency structure every shortest-path search runs against.
//!
//! ## Layout
//!
//! Node ids are interned into dense [`NodeIndex`] values assigned in
//! ascending lexicographic order of the id. Each node's outgoing edges are
//! stored as `(target, weight)` pairs sorted by target index. Algorithms
//! can therefore keep per-call state in plain `Vec`s indexed by node, and
//! edge enumeration order is fixed for a given input.
//!
//! ## Ingestion
//!
//! The graph is built from an already-materialized edge list ([`EdgeSpec`])
//! or a deserialized [`GraphDocument`]. File parsing belongs to the caller.
//! Edges form a mapping `source -> (target -> weight)`, so a repeated
//! `(source, target)` pair overwrites the earlier weight.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::MalformedGraphError;
use crate::identity::NodeId;

/// Dense index of a node inside one [`Graph`].
///
/// Only meaningful for the graph that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// The index as a `usize`, for addressing per-node arrays.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One ingested edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Edge weight. Must be finite; sign is unrestricted. The absolute
    /// weights of a graph must also sum to a finite `f64`.
    pub weight: f64,
}

impl EdgeSpec {
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

/// Serialized graph form: an edge list plus optional isolated nodes.
///
/// ```json
/// { "nodes": ["Z"], "edges": [{ "source": "A", "target": "B", "weight": 5.0 }] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes to include even if no edge touches them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,
    /// Directed weighted edges.
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

/// Summary facts about a graph, computed once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Number of distinct nodes.
    pub node_count: usize,
    /// Number of distinct `(source, target)` edges.
    pub edge_count: usize,
    /// Whether any edge weight is strictly negative.
    pub has_negative_weight: bool,
    /// Number of edges with a strictly negative weight.
    pub negative_edge_count: usize,
}

/// Borrowed view of one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeRef<'g> {
    pub source: &'g NodeId,
    pub target: &'g NodeId,
    pub weight: f64,
}

/// Immutable directed graph with real-valued edge weights.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Node ids, sorted ascending. Position is the node's index.
    nodes: Vec<NodeId>,
    index: HashMap<NodeId, NodeIndex>,
    /// Outgoing edges per node, sorted by target index.
    adjacency: Vec<Vec<(NodeIndex, f64)>>,
    metadata: GraphMetadata,
}

impl Graph {
    /// A graph with no nodes and no edges.
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
            metadata: GraphMetadata {
                node_count: 0,
                edge_count: 0,
                has_negative_weight: false,
                negative_edge_count: 0,
            },
        }
    }

    /// Build a graph from an edge list.
    pub fn from_edges<I>(edges: I) -> Result<Self, MalformedGraphError>
    where
        I: IntoIterator<Item = EdgeSpec>,
    {
        Self::build(Vec::new(), edges)
    }

    /// Build a graph from a deserialized document.
    pub fn from_document(document: GraphDocument) -> Result<Self, MalformedGraphError> {
        Self::build(document.nodes, document.edges)
    }

    fn build<I>(declared: Vec<String>, edges: I) -> Result<Self, MalformedGraphError>
    where
        I: IntoIterator<Item = EdgeSpec>,
    {
        let mut node_set: BTreeSet<String> = BTreeSet::new();
        let mut mapping: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

        for (i, node) in declared.into_iter().enumerate() {
            if node.trim().is_empty() {
                return Err(MalformedGraphError::EmptyNodeId {
                    edge_index: i,
                    position: "declared",
                });
            }
            node_set.insert(node);
        }

        for (i, edge) in edges.into_iter().enumerate() {
            if edge.source.trim().is_empty() {
                return Err(MalformedGraphError::EmptyNodeId {
                    edge_index: i,
                    position: "source",
                });
            }
            if edge.target.trim().is_empty() {
                return Err(MalformedGraphError::EmptyNodeId {
                    edge_index: i,
                    position: "target",
                });
            }
            if !edge.weight.is_finite() {
                return Err(MalformedGraphError::NonFiniteWeight {
                    from: edge.source,
                    to: edge.target,
                    weight: edge.weight,
                });
            }
            node_set.insert(edge.source.clone());
            node_set.insert(edge.target.clone());
            mapping
                .entry(edge.source)
                .or_default()
                .insert(edge.target, edge.weight);
        }

        if node_set.len() > u32::MAX as usize {
            return Err(MalformedGraphError::TooManyNodes {
                count: node_set.len(),
                max: u32::MAX as usize,
            });
        }

        let mut nodes = Vec::with_capacity(node_set.len());
        let mut index = HashMap::with_capacity(node_set.len());
        for (i, id) in node_set.into_iter().enumerate() {
            let node = NodeId::parse(id).ok_or(MalformedGraphError::EmptyNodeId {
                edge_index: i,
                position: "declared",
            })?;
            index.insert(node.clone(), NodeIndex(i as u32));
            nodes.push(node);
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        let mut edge_count = 0;
        let mut negative_edge_count = 0;
        let mut absolute_weight_sum = 0.0_f64;
        for (source, targets) in mapping {
            let Some(&src) = index.get(source.as_str()) else {
                continue;
            };
            let out = &mut adjacency[src.index()];
            for (target, weight) in targets {
                let Some(&dst) = index.get(target.as_str()) else {
                    continue;
                };
                if weight < 0.0 {
                    negative_edge_count += 1;
                }
                edge_count += 1;
                absolute_weight_sum += weight.abs();
                out.push((dst, weight));
            }
        }
        // Bounds the cost of every simple path.
        if !absolute_weight_sum.is_finite() {
            return Err(MalformedGraphError::CostOverflow);
        }

        let metadata = GraphMetadata {
            node_count: nodes.len(),
            edge_count,
            has_negative_weight: negative_edge_count > 0,
            negative_edge_count,
        };

        Ok(Self {
            nodes,
            index,
            adjacency,
            metadata,
        })
    }

    /// Precomputed summary facts.
    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.metadata.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `node` is part of the graph.
    pub fn contains(&self, node: &str) -> bool {
        self.index.contains_key(node)
    }

    /// Dense index of `node`, if present.
    pub fn node_index(&self, node: &str) -> Option<NodeIndex> {
        self.index.get(node).copied()
    }

    /// Node id at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` did not come from this graph.
    pub fn node(&self, index: NodeIndex) -> &NodeId {
        &self.nodes[index.index()]
    }

    /// All node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes.iter()
    }

    /// All node indices in ascending order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len() as u32).map(NodeIndex)
    }

    /// Outgoing `(target, weight)` pairs of a node, sorted by target.
    pub fn out_edges(&self, index: NodeIndex) -> &[(NodeIndex, f64)] {
        self.adjacency
            .get(index.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Outgoing neighbors of `node` with edge weights. Empty if `node` is absent.
    pub fn neighbors<'g>(&'g self, node: &str) -> impl Iterator<Item = (&'g NodeId, f64)> + 'g {
        let out = self
            .node_index(node)
            .map(|i| self.out_edges(i))
            .unwrap_or(&[]);
        out.iter().map(move |&(t, w)| (self.node(t), w))
    }

    /// Weight of the edge `source -> target`, if it exists.
    pub fn edge_weight(&self, source: &str, target: &str) -> Option<f64> {
        let src = self.node_index(source)?;
        let dst = self.node_index(target)?;
        let out = self.out_edges(src);
        out.binary_search_by(|(t, _)| t.cmp(&dst))
            .ok()
            .map(|pos| out[pos].1)
    }

    /// Every edge, ordered by source id then target id.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_>> + '_ {
        self.adjacency.iter().enumerate().flat_map(move |(s, out)| {
            let source = &self.nodes[s];
            out.iter().map(move |&(t, weight)| EdgeRef {
                source,
                target: self.node(t),
                weight,
            })
        })
    }

    /// Every edge with a strictly negative weight, in [`Graph::edges`] order.
    pub fn negative_edges(&self) -> Vec<EdgeRef<'_>> {
        self.edges().filter(|e| e.weight < 0.0).collect()
    }

    /// Serialize back to the ingestion form. Isolated nodes are listed
    /// explicitly so the document rebuilds an identical graph.
    pub fn to_document(&self) -> GraphDocument {
        let mut has_edge = vec![false; self.nodes.len()];
        for (s, out) in self.adjacency.iter().enumerate() {
            if !out.is_empty() {
                has_edge[s] = true;
            }
            for (t, _) in out {
                has_edge[t.index()] = true;
            }
        }
        GraphDocument {
            nodes: self
                .nodes
                .iter()
                .zip(has_edge)
                .filter(|(_, touched)| !touched)
                .map(|(n, _)| n.to_string())
                .collect(),
            edges: self
                .edges()
                .map(|e| EdgeSpec::new(e.source.as_str(), e.target.as_str(), e.weight))
                .collect(),
        }
    }
}

impl TryFrom<GraphDocument> for Graph {
    type Error = MalformedGraphError;

    fn try_from(document: GraphDocument) -> Result<Self, Self::Error> {
        Self::from_document(document)
    }
}
