//! Constant-time adjacency lookups over a built graph.
//!
//! The index is disposable: it is rebuilt wholesale from the current
//! node/edge lists whenever the builder's output changes. Nothing patches it
//! in place, which rules out stale-adjacency bugs at the cost of a linear
//! rebuild (cheap at the hundreds-to-low-thousands scale this serves).

use crate::{GraphEdge, GraphNode, GraphOutput, NodeId};
use ahash::AHashMap as HashMap;

#[derive(Clone, Debug, Default)]
pub struct GraphLookup {
    nodes_by_id: HashMap<NodeId, GraphNode>,
    outgoing: HashMap<NodeId, Vec<GraphEdge>>,
    incoming: HashMap<NodeId, Vec<GraphEdge>>,
}

// === impl GraphLookup ===

impl GraphLookup {
    /// Builds the index in one pass over the nodes and one pass over the
    /// edges.
    pub fn new(graph: &GraphOutput) -> Self {
        let mut nodes_by_id = HashMap::with_capacity(graph.nodes.len());
        for node in graph.nodes.iter() {
            nodes_by_id.insert(node.id.clone(), node.clone());
        }

        let mut outgoing = HashMap::<NodeId, Vec<GraphEdge>>::default();
        let mut incoming = HashMap::<NodeId, Vec<GraphEdge>>::default();
        for edge in graph.edges.iter() {
            outgoing
                .entry(edge.source.clone())
                .or_default()
                .push(edge.clone());
            incoming
                .entry(edge.target.clone())
                .or_default()
                .push(edge.clone());
        }

        Self {
            nodes_by_id,
            outgoing,
            incoming,
        }
    }

    /// Returns the node with the given id, if any.
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes_by_id.get(id)
    }

    /// Returns the edges whose source is the given node. Empty when the id is
    /// unknown.
    pub fn outgoing(&self, id: &NodeId) -> &[GraphEdge] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the edges whose target is the given node. Empty when the id is
    /// unknown.
    pub fn incoming(&self, id: &NodeId) -> &[GraphEdge] {
        self.incoming.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}
