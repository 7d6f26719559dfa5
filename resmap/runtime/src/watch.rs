use kube::{
    api::{Api, ApiResource, DynamicObject},
    core::GroupVersionKind,
    runtime::{watcher, WatchStreamExt},
    Client,
};
use resmap_k8s_store::{sync, SnapshotRx, Store, StoreMetrics};
use tracing::{info_span, Instrument};

/// Spawns a sync task driving a store for one kind and returns its snapshot
/// receiver.
///
/// The task watches a single namespace when the scope names one and the kind
/// is namespaced; otherwise it watches cluster-wide. It runs until the drain
/// fires or the watch stream ends.
pub(crate) fn spawn(
    client: Client,
    drain: drain::Watch,
    namespace: Option<&str>,
    gvk: GroupVersionKind,
    plural: &str,
    namespaced: bool,
    metrics: StoreMetrics,
) -> SnapshotRx {
    let resource = ApiResource::from_gvk_with_plural(&gvk, plural);
    let api = match namespace.filter(|_| namespaced) {
        Some(ns) => Api::<DynamicObject>::namespaced_with(client, ns, &resource),
        None => Api::<DynamicObject>::all_with(client, &resource),
    };
    let events = watcher(api, watcher::Config::default()).default_backoff();

    let store = Store::new(gvk.clone()).with_metrics(metrics);
    let rx = store.subscribe();
    tokio::spawn(
        sync(store, events, drain)
            .instrument(info_span!("watch", kind = %gvk.kind, group = %gvk.group)),
    );
    rx
}
