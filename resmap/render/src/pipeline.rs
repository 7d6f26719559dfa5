use crate::engine::{Layout, LayoutEngine};
use resmap_core::{weight, GraphOutput, NodeId};
use std::sync::Arc;

/// One input to the pipeline: the current graph plus whether global data is
/// still loading.
#[derive(Clone, Debug)]
pub struct Frame {
    pub loading: bool,
    pub graph: Arc<GraphOutput>,
}

/// A graph with its computed layout.
#[derive(Debug)]
pub struct LaidGraph {
    pub graph: Arc<GraphOutput>,
    pub layout: Layout,
}

/// What the renderer should draw for a frame.
pub enum Scene {
    /// Data is still loading: an empty node/edge set plus a loading
    /// indicator. Never a partial graph.
    Loading,
    /// Loading finished and there is nothing to show; draw the explicit
    /// "no data" affordance rather than a blank canvas.
    Empty,
    Graph(Arc<LaidGraph>),
}

/// A clickable element, forwarded to the caller's selection callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    Node(NodeId),
    Edge(String),
}

type SelectFn = Arc<dyn Fn(&Element) + Send + Sync>;

/// Feeds the layout engine incrementally and keeps the last good layout.
pub struct Pipeline {
    engine: Box<dyn LayoutEngine>,
    last: Option<Arc<LaidGraph>>,
    on_select: Option<SelectFn>,
}

// === impl Pipeline ===

impl Pipeline {
    pub fn new(engine: impl LayoutEngine + 'static) -> Self {
        Self {
            engine: Box::new(engine),
            last: None,
            on_select: None,
        }
    }

    /// Registers the caller's selection callback. The pipeline holds no
    /// selection state of its own.
    pub fn on_select(mut self, callback: impl Fn(&Element) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Arc::new(callback));
        self
    }

    pub fn render(&mut self, frame: &Frame) -> Scene {
        if frame.loading {
            return Scene::Loading;
        }

        if frame.graph.is_empty() {
            return Scene::Empty;
        }

        // Same graph identity means the previous layout is still valid.
        if let Some(last) = &self.last {
            if Arc::ptr_eq(&last.graph, &frame.graph) {
                return Scene::Graph(last.clone());
            }
        }

        let weights = frame
            .graph
            .nodes
            .iter()
            .map(weight::resolve)
            .collect::<Vec<_>>();
        match self.engine.layout(&frame.graph, &weights) {
            Ok(layout) => {
                let laid = Arc::new(LaidGraph {
                    graph: frame.graph.clone(),
                    layout,
                });
                self.last = Some(laid.clone());
                Scene::Graph(laid)
            }
            Err(error) => {
                // Fatal for this frame only: keep the previous layout on
                // screen instead of blanking the view.
                tracing::warn!(%error, "Layout failed");
                match &self.last {
                    Some(last) => Scene::Graph(last.clone()),
                    None => Scene::Empty,
                }
            }
        }
    }

    /// Forwards a click on a node or edge to the caller.
    pub fn select(&self, element: Element) {
        if let Some(callback) = &self.on_select {
            callback(&element);
        }
    }
}
