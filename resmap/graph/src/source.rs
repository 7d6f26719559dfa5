use ahash::AHashMap as HashMap;
use kube::{
    core::{DynamicObject, GroupVersionKind},
    ResourceExt,
};
use parking_lot::Mutex;
use resmap_core::{GraphNode, NodeId};
use resmap_k8s_store::SnapshotRx;
use std::sync::Arc;

/// A uniform producer of graph nodes, regardless of where the data comes
/// from.
///
/// `nodes` returns `None` while the underlying data has not loaded yet;
/// "zero results" is `Some` of an empty array. Implementations must be pure
/// with respect to their inputs: the same underlying object list yields the
/// same node array (by identity), so the builder can memoize.
pub trait GraphSource: Send + Sync {
    fn id(&self) -> &str;

    fn label(&self) -> &str;

    fn icon(&self) -> Option<&str> {
        None
    }

    fn nodes(&self) -> Option<Arc<[GraphNode]>>;

    /// A transport error to surface alongside the data, if any.
    fn error(&self) -> Option<String> {
        None
    }
}

/// A source backed by one kind's reconciled store.
pub struct KindSource {
    id: String,
    label: String,
    icon: Option<String>,
    gvk: GroupVersionKind,
    rx: SnapshotRx,

    /// Last node array, keyed by the snapshot item array it was derived
    /// from, so an unchanged collection always yields the identical `Arc`.
    /// Holding the array pins its allocation, so pointer equality can never
    /// alias a newer collection placed at a recycled address.
    memo: Mutex<Option<(Arc<[Arc<DynamicObject>]>, Arc<[GraphNode]>)>>,
}

// === impl KindSource ===

impl KindSource {
    pub fn new(gvk: GroupVersionKind, rx: SnapshotRx) -> Self {
        let id = if gvk.group.is_empty() {
            gvk.kind.to_ascii_lowercase()
        } else {
            format!("{}.{}", gvk.kind.to_ascii_lowercase(), gvk.group)
        };
        Self {
            id,
            label: gvk.kind.clone(),
            icon: None,
            gvk,
            rx,
            memo: Mutex::new(None),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

impl GraphSource for KindSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    fn nodes(&self) -> Option<Arc<[GraphNode]>> {
        let snapshot = self.rx.borrow().clone();
        if !snapshot.is_ready() {
            return None;
        }

        let mut memo = self.memo.lock();
        if let Some((seen, nodes)) = &*memo {
            if Arc::ptr_eq(seen, snapshot.items_handle()) {
                return Some(nodes.clone());
            }
        }

        let nodes: Arc<[GraphNode]> = snapshot
            .items()
            .iter()
            .filter_map(|obj| {
                let uid = obj.uid()?;
                Some(GraphNode {
                    id: NodeId::resource(&self.gvk.kind, &self.gvk.group, &uid),
                    label: obj.name_any(),
                    kind: Some(self.gvk.kind.clone()),
                    weight: None,
                    source_object: Some(obj.clone()),
                })
            })
            .collect();
        *memo = Some((snapshot.items_handle().clone(), nodes.clone()));
        Some(nodes)
    }

    fn error(&self) -> Option<String> {
        self.rx.borrow().error().map(String::from)
    }
}

/// A source with a fixed node list. Used for fixtures and derived data that
/// is computed once.
pub struct FixedSource {
    id: String,
    label: String,
    nodes: Option<Arc<[GraphNode]>>,
}

// === impl FixedSource ===

impl FixedSource {
    pub fn loaded(id: impl Into<String>, label: impl Into<String>, nodes: Vec<GraphNode>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            nodes: Some(nodes.into()),
        }
    }

    /// A source that is permanently "not loaded yet".
    pub fn pending(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            nodes: None,
        }
    }
}

impl GraphSource for FixedSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn nodes(&self) -> Option<Arc<[GraphNode]>> {
        self.nodes.clone()
    }
}

/// One entry in a source tree.
pub enum SourceTree {
    Leaf(Arc<dyn GraphSource>),
    Group(SourceGroup),
}

/// Aggregates sources and sub-groups under one id/label for UI toggling.
/// Performs no data transformation of its own.
pub struct SourceGroup {
    id: String,
    label: String,
    icon: Option<String>,
    default_enabled: bool,
    children: Vec<SourceTree>,
}

// === impl SourceGroup ===

impl SourceGroup {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: None,
            default_enabled: true,
            children: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    pub fn push_source(mut self, source: impl GraphSource + 'static) -> Self {
        self.children.push(SourceTree::Leaf(Arc::new(source)));
        self
    }

    pub fn push_group(mut self, group: SourceGroup) -> Self {
        self.children.push(SourceTree::Group(group));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn is_enabled_by_default(&self) -> bool {
        self.default_enabled
    }

    /// Collects the leaf sources that are enabled under the given selection.
    /// A disabled group prunes its whole subtree.
    pub fn enabled_leaves(&self, selection: &SourceSelection) -> Vec<Arc<dyn GraphSource>> {
        let mut leaves = Vec::new();
        self.collect_leaves(selection, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, selection: &SourceSelection, out: &mut Vec<Arc<dyn GraphSource>>) {
        if !selection.is_enabled(&self.id, self.default_enabled) {
            return;
        }
        for child in &self.children {
            match child {
                SourceTree::Leaf(source) => {
                    if selection.is_enabled(source.id(), true) {
                        out.push(source.clone());
                    }
                }
                SourceTree::Group(group) => group.collect_leaves(selection, out),
            }
        }
    }
}

/// User toggles over groups and sources, by id. Absent ids fall back to the
/// group's `is_enabled_by_default` flag.
#[derive(Clone, Debug, Default)]
pub struct SourceSelection {
    overrides: HashMap<String, bool>,
}

// === impl SourceSelection ===

impl SourceSelection {
    pub fn set_enabled(&mut self, id: impl Into<String>, enabled: bool) {
        self.overrides.insert(id.into(), enabled);
    }

    pub fn clear(&mut self, id: &str) {
        self.overrides.remove(id);
    }

    fn is_enabled(&self, id: &str, default: bool) -> bool {
        self.overrides.get(id).copied().unwrap_or(default)
    }
}
