use crate::watch;
use futures::future;
use kube::{core::DynamicObject, Client};
use resmap_core::GraphLookup;
use resmap_graph::{
    builtin_tree, crd_kinds, crd_tree, GraphBuilder, SourceGroup, SourceSelection,
};
use resmap_k8s_store::{SnapshotRx, StoreCache, StoreMetrics};
use resmap_render::{Frame, Pipeline, Scene, TierLayout};
use std::sync::Arc;

/// Rebuilds the graph whenever any store publishes a new snapshot.
///
/// One task owns the whole rebuild path: CRD discovery, source assembly,
/// graph construction, and layout. Stores publish snapshots concurrently but
/// every graph the task emits is derived from a single consistent read of
/// them.
pub(crate) struct MapTask {
    client: Client,
    cache: StoreCache,
    crds: SnapshotRx,
    metrics: StoreMetrics,

    /// Built once over the built-in stores so per-source memoization
    /// survives across rebuilds.
    tree: SourceGroup,
    /// Rebuilt only when the CRD snapshot identity changes. The seen item
    /// array is held so its address cannot be recycled under the comparison.
    crd_groups: Vec<SourceGroup>,
    crd_seen: Option<Arc<[Arc<DynamicObject>]>>,

    selection: SourceSelection,
    builder: GraphBuilder,
    pipeline: Pipeline,

    /// Receivers polled for wakeups. Grows as custom kinds are discovered.
    wakeups: Vec<SnapshotRx>,
}

// === impl MapTask ===

impl MapTask {
    pub(crate) fn new(
        client: Client,
        cache: StoreCache,
        crds: SnapshotRx,
        metrics: StoreMetrics,
    ) -> Self {
        // Mark every receiver changed so the first loop iteration renders
        // without waiting for an event.
        let mut wakeups = cache
            .iter()
            .map(|(_, rx)| {
                let mut rx = rx.clone();
                rx.mark_changed();
                rx
            })
            .collect::<Vec<_>>();
        let mut crd_wakeup = crds.clone();
        crd_wakeup.mark_changed();
        wakeups.push(crd_wakeup);

        let tree = builtin_tree(&cache);

        Self {
            client,
            cache,
            crds,
            metrics,
            tree,
            crd_groups: Vec::new(),
            crd_seen: None,
            selection: SourceSelection::default(),
            builder: GraphBuilder::new(),
            pipeline: Pipeline::new(TierLayout::default()),
            wakeups,
        }
    }

    pub(crate) async fn run(mut self, drain: drain::Watch) {
        let shutdown = drain.signaled();
        tokio::pin!(shutdown);

        loop {
            self.render();

            let changed = future::select_all(
                self.wakeups
                    .iter_mut()
                    .map(|rx| Box::pin(rx.changed())),
            );
            let closed = tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("Shutdown; stopping map task");
                    return;
                }

                (res, index, rest) = changed => {
                    drop(rest);
                    res.is_err().then_some(index)
                }
            };
            if let Some(index) = closed {
                // The store's scope was drained; stop polling it.
                self.wakeups.swap_remove(index);
                if self.wakeups.is_empty() {
                    tracing::debug!("All stores drained; stopping map task");
                    return;
                }
            }
        }
    }

    fn render(&mut self) {
        self.refresh_crds();

        let mut sources = self.tree.enabled_leaves(&self.selection);
        for group in &self.crd_groups {
            sources.extend(group.enabled_leaves(&self.selection));
        }
        for source in &sources {
            if let Some(error) = source.error() {
                tracing::debug!(source = %source.id(), %error, "Source degraded");
            }
        }

        let loading = GraphBuilder::is_loading(&sources);
        let graph = self.builder.build(&sources);

        match self.pipeline.render(&Frame {
            loading,
            graph: graph.clone(),
        }) {
            Scene::Loading => tracing::debug!("Waiting for stores to load"),
            Scene::Empty => tracing::info!("Nothing to draw"),
            Scene::Graph(laid) => {
                let lookup = GraphLookup::new(&laid.graph);
                let roots = laid
                    .graph
                    .nodes
                    .iter()
                    .filter(|n| lookup.incoming(&n.id).is_empty())
                    .count();
                tracing::info!(
                    nodes = laid.graph.nodes.len(),
                    edges = laid.graph.edges.len(),
                    roots,
                    "Rendered"
                );
            }
        }
    }

    /// Spawns watches for newly discovered custom kinds and regenerates
    /// their source groups. No-op until the CRD snapshot changes.
    fn refresh_crds(&mut self) {
        let snapshot = self.crds.borrow().clone();
        if self
            .crd_seen
            .as_ref()
            .is_some_and(|seen| Arc::ptr_eq(seen, snapshot.items_handle()))
        {
            return;
        }
        self.crd_seen = Some(snapshot.items_handle().clone());
        if !snapshot.is_ready() {
            return;
        }

        let namespace = self.cache.scope().namespace.clone();
        for discovered in crd_kinds(&snapshot) {
            if self.cache.get(&discovered.gvk).is_some() {
                continue;
            }
            tracing::info!(
                kind = %discovered.gvk.kind,
                group = %discovered.gvk.group,
                "Watching custom kind"
            );
            let rx = watch::spawn(
                self.client.clone(),
                self.cache.drain_watch(),
                namespace.as_deref(),
                discovered.gvk.clone(),
                &discovered.plural,
                discovered.namespaced,
                self.metrics.clone(),
            );
            let mut wakeup = rx.clone();
            wakeup.mark_changed();
            self.cache.insert(discovered.gvk.clone(), rx);
            self.wakeups.push(wakeup);
        }

        self.crd_groups = crd_tree(&snapshot, &self.cache);
    }
}
