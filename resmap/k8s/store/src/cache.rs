use crate::store::SnapshotRx;
use ahash::AHashMap as HashMap;
use kube::core::GroupVersionKind;

/// The cluster/namespace scope a cache is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub cluster: String,
    /// `None` watches all namespaces.
    pub namespace: Option<String>,
}

/// Holds the snapshot receivers for every kind watched in one scope, plus
/// the drain handle that cancels their sync tasks.
///
/// The cache is passed by reference to whoever needs a store; there is no
/// process-wide registry. Changing scope means draining this cache and
/// building a new one, so subscriptions for the old scope can never feed a
/// live collection.
pub struct StoreCache {
    scope: Scope,
    signal: Option<drain::Signal>,
    watch: drain::Watch,
    stores: HashMap<String, (GroupVersionKind, SnapshotRx)>,
}

// === impl StoreCache ===

impl StoreCache {
    pub fn new(scope: Scope) -> Self {
        let (signal, watch) = drain::channel();
        Self {
            scope,
            signal: Some(signal),
            watch,
            stores: HashMap::default(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The drain watch every sync task of this scope must select against.
    pub fn drain_watch(&self) -> drain::Watch {
        self.watch.clone()
    }

    pub fn insert(&mut self, gvk: GroupVersionKind, rx: SnapshotRx) {
        self.stores.insert(key(&gvk), (gvk, rx));
    }

    pub fn get(&self, gvk: &GroupVersionKind) -> Option<SnapshotRx> {
        self.stores.get(&key(gvk)).map(|(_, rx)| rx.clone())
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupVersionKind, &SnapshotRx)> {
        self.stores.values().map(|(gvk, rx)| (gvk, rx))
    }

    /// Evicts everything, cancelling all sync tasks for this scope, and
    /// returns a fresh cache bound to the new scope.
    pub async fn reset(mut self, scope: Scope) -> Self {
        if let Some(signal) = self.signal.take() {
            signal.drain().await;
        }
        tracing::debug!(cluster = %scope.cluster, namespace = ?scope.namespace, "Store cache reset");
        Self::new(scope)
    }
}

fn key(gvk: &GroupVersionKind) -> String {
    format!("{}/{}/{}", gvk.group, gvk.version, gvk.kind)
}
