use resmap_core::{GraphOutput, NodeId};

/// A 2D point in layout coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One routed segment of an edge: a start point, an end point, and any
/// number (>= 0) of intermediate bend points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeSection {
    pub start: Point,
    pub end: Point,
    pub bend_points: Vec<Point>,
}

/// A node's computed placement.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeLayout {
    pub id: NodeId,
    pub position: Point,
}

/// An edge's computed geometry: a parent-relative offset plus one or more
/// path sections.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeLayout {
    pub id: String,
    pub offset: Point,
    pub sections: Vec<EdgeSection>,
}

/// The full result of one layout run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
}

#[derive(Debug, thiserror::Error)]
#[error("layout failed: {0}")]
pub struct LayoutError(pub String);

/// An external automatic-layout service.
///
/// `weights` is parallel to `graph.nodes` and biases vertical/priority
/// placement; higher weights should land above lower ones.
pub trait LayoutEngine: Send + Sync {
    fn layout(&self, graph: &GraphOutput, weights: &[i64]) -> Result<Layout, LayoutError>;
}
