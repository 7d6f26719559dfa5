//! Rendering-agnostic graph model for the resource map.
//!
//! A `GraphNode` is derived from one cluster object (or synthesized for a
//! group); a `GraphEdge` is always derived, never independently owned, and is
//! regenerated whenever the builder re-runs. The `GraphLookup` index and the
//! layout weight resolver are pure views over a `GraphOutput` and are rebuilt
//! wholesale on every change rather than patched incrementally.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod lookup;
pub mod weight;

pub use self::lookup::GraphLookup;

use kube::core::DynamicObject;
use std::{fmt, sync::Arc};

/// Identifies a node in the graph.
///
/// Resource nodes use `<kind>.<group>/<uid>` (`<kind>/<uid>` for the core
/// group) so that an id can be recomputed from an ownerReference without
/// consulting an index. Synthetic nodes (groups, placeholders) use whatever
/// id their source assigned.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn synthetic(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the id of a resource node from its identity fields.
    pub fn resource(kind: &str, group: &str, uid: &str) -> Self {
        if group.is_empty() {
            Self(format!("{kind}/{uid}"))
        } else {
            Self(format!("{kind}.{group}/{uid}"))
        }
    }

    /// Derives the id of the node referenced by an ownerReference.
    ///
    /// `api_version` is of the form `group/version` or, for the core group,
    /// just `version`.
    pub fn owner(api_version: &str, kind: &str, uid: &str) -> Self {
        let group = match api_version.split_once('/') {
            Some((group, _version)) => group,
            None => "",
        };
        Self::resource(kind, group, uid)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The kind of relationship an edge encodes.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relation {
    /// The source object's metadata declares it owns the target.
    Owner,
    /// The target backs the source (e.g. an EndpointSlice backing a Service).
    Backs,
    /// The source selects the target by labels (e.g. a Service selecting Pods).
    Selects,
    /// The source names the target explicitly (e.g. an Ingress backend).
    References,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => "owner".fmt(f),
            Self::Backs => "backs".fmt(f),
            Self::Selects => "selects".fmt(f),
            Self::References => "references".fmt(f),
        }
    }
}

/// A node in the resource graph.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub id: NodeId,

    /// Human-readable label, usually the object name.
    pub label: String,

    /// The kind of the underlying object, when there is one.
    pub kind: Option<String>,

    /// Explicit layout weight. When unset, the kind's default tier applies.
    pub weight: Option<i64>,

    /// The object this node was derived from. Unset for synthetic nodes.
    pub source_object: Option<Arc<DynamicObject>>,
}

impl GraphNode {
    pub fn synthetic(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: NodeId::synthetic(id),
            label: label.into(),
            kind: None,
            weight: None,
            source_object: None,
        }
    }
}

/// A derived edge between two nodes. Deduplicated by
/// `(source, target, relation)`; an edge whose endpoint is not in the current
/// node set is dropped, not an error.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
}

impl GraphEdge {
    pub fn new(source: NodeId, target: NodeId, relation: Relation) -> Self {
        Self {
            source,
            target,
            relation,
        }
    }

    /// A stable identifier for the edge, derived from its endpoints.
    pub fn id(&self) -> String {
        format!("{}->{}:{}", self.source, self.target, self.relation)
    }
}

/// The builder's output: a consistent node/edge snapshot.
///
/// Downstream consumers treat pointer identity as "unchanged": the builder
/// returns the same `Arc` when its inputs were referentially unchanged, and
/// the render pipeline re-lays-out only when the identity differs.
#[derive(Clone, Debug)]
pub struct GraphOutput {
    pub nodes: Arc<[GraphNode]>,
    pub edges: Arc<[GraphEdge]>,
}

impl GraphOutput {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Arc<Self> {
        Arc::new(Self {
            nodes: nodes.into(),
            edges: edges.into(),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
