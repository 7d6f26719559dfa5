use crate::{cache::Scope, Event, Snapshot, Store, StoreCache, StoreError};
use kube::core::{DynamicObject, ErrorResponse, GroupVersionKind, ObjectMeta, TypeMeta};
use kube::runtime::watcher;
use std::sync::Arc;
use tokio::{sync::mpsc, time};
use tokio_stream::wrappers::UnboundedReceiverStream;

fn pod_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("", "v1", "Pod")
}

fn mk_obj(kind: &str, name: &str, uid: &str, rv: &str) -> DynamicObject {
    DynamicObject {
        types: Some(TypeMeta {
            api_version: "v1".to_string(),
            kind: kind.to_string(),
        }),
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("ns-0".to_string()),
            uid: Some(uid.to_string()),
            resource_version: Some(rv.to_string()),
            ..Default::default()
        },
        data: serde_json::json!({}),
    }
}

fn uids(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .items()
        .iter()
        .map(|obj| obj.metadata.uid.clone().unwrap())
        .collect()
}

#[test]
fn added_is_idempotent() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    store
        .apply(Event::Added(mk_obj("Pod", "pod-0", "uid-0", "1")))
        .unwrap();
    store
        .apply(Event::Added(mk_obj("Pod", "pod-0", "uid-0", "2")))
        .unwrap();

    let snapshot = rx.borrow().clone();
    assert_eq!(uids(&snapshot), vec!["uid-0"]);
    assert_eq!(
        snapshot.items()[0].metadata.resource_version.as_deref(),
        Some("2"),
        "second payload must win",
    );
}

#[test]
fn modified_before_added_appends() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    store
        .apply(Event::Modified(mk_obj("Pod", "pod-x", "x", "1")))
        .unwrap();

    assert_eq!(uids(&rx.borrow()), vec!["x"]);
}

#[test]
fn delete_of_absent_uid_is_a_noop() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    store
        .apply(Event::Added(mk_obj("Pod", "pod-0", "uid-0", "1")))
        .unwrap();
    let before = rx.borrow().clone();

    store
        .apply(Event::Deleted(mk_obj("Pod", "gone", "missing", "1")))
        .unwrap();

    let after = rx.borrow().clone();
    assert_eq!(uids(&before), uids(&after));
    assert!(
        Arc::ptr_eq(before.items_handle(), after.items_handle()),
        "a no-op delete must not republish a new item array",
    );
}

#[test]
fn error_events_are_inert() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    store
        .apply(Event::Added(mk_obj("Pod", "pod-0", "uid-0", "1")))
        .unwrap();
    let before = rx.borrow().clone();

    store
        .apply(Event::Error(ErrorResponse {
            status: "Failure".to_string(),
            message: "too old resource version".to_string(),
            reason: "Expired".to_string(),
            code: 410,
        }))
        .unwrap();

    let after = rx.borrow().clone();
    assert_eq!(uids(&after), vec!["uid-0"]);
    assert!(
        Arc::ptr_eq(before.items_handle(), after.items_handle()),
        "an error must not invalidate the item array identity",
    );
    assert_eq!(after.error(), Some("too old resource version"));
}

#[test]
fn unrecognized_events_are_inert() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    store
        .apply(Event::Added(mk_obj("Pod", "pod-0", "uid-0", "1")))
        .unwrap();
    store.apply(Event::Other("BOOKMARK".to_string())).unwrap();

    assert_eq!(uids(&rx.borrow()), vec!["uid-0"]);
}

#[test]
fn malformed_events_are_rejected_without_mutation() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    let mut no_uid = mk_obj("Pod", "pod-0", "uid-0", "1");
    no_uid.metadata.uid = None;
    assert!(matches!(
        store.apply(Event::Added(no_uid)),
        Err(StoreError::MissingUid)
    ));

    let mut no_kind = mk_obj("Pod", "pod-1", "uid-1", "1");
    no_kind.types = None;
    assert!(matches!(
        store.apply(Event::Added(no_kind)),
        Err(StoreError::MissingKind)
    ));

    assert!(rx.borrow().items().is_empty());
}

#[test]
fn events_preserve_insertion_order() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    store.initialize(vec![mk_obj("Pod", "pod-1", "1", "1")], Some("42".to_string()));
    assert_eq!(rx.borrow().resource_version(), Some("42"));

    store
        .apply(Event::Added(mk_obj("Pod", "pod-2", "2", "2")))
        .unwrap();
    assert_eq!(uids(&rx.borrow()), vec!["1", "2"]);

    store
        .apply(Event::Modified(mk_obj("Pod", "pod-1", "1", "2")))
        .unwrap();
    {
        let snapshot = rx.borrow().clone();
        assert_eq!(uids(&snapshot), vec!["1", "2"], "modify must keep position");
        assert_eq!(
            snapshot.items()[0].metadata.resource_version.as_deref(),
            Some("2"),
        );
    }

    store
        .apply(Event::Deleted(mk_obj("Pod", "pod-1", "1", "2")))
        .unwrap();
    assert_eq!(uids(&rx.borrow()), vec!["2"]);
}

#[test]
fn initialize_deduplicates_by_uid() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    store.initialize(
        vec![
            mk_obj("Pod", "pod-0", "uid-0", "1"),
            mk_obj("Pod", "pod-0", "uid-0", "2"),
            mk_obj("Pod", "pod-1", "uid-1", "1"),
        ],
        None,
    );

    let snapshot = rx.borrow().clone();
    assert!(snapshot.is_ready());
    assert_eq!(uids(&snapshot), vec!["uid-0", "uid-1"]);
    assert_eq!(
        snapshot.get("uid-0").unwrap().metadata.resource_version.as_deref(),
        Some("2"),
    );
}

#[test]
fn applies_change_item_identity() {
    let mut store = Store::new(pod_gvk());
    let rx = store.subscribe();

    store
        .apply(Event::Added(mk_obj("Pod", "pod-0", "uid-0", "1")))
        .unwrap();
    let before = rx.borrow().clone();

    store
        .apply(Event::Modified(mk_obj("Pod", "pod-0", "uid-0", "2")))
        .unwrap();
    let after = rx.borrow().clone();

    assert!(!Arc::ptr_eq(before.items_handle(), after.items_handle()));
}

#[tokio::test]
async fn sync_buffers_the_initial_list() {
    let store = Store::new(pod_gvk());
    let mut rx = store.subscribe();
    let (tx, events) = mpsc::unbounded_channel();
    let (_signal, watch) = drain::channel();
    let task = tokio::spawn(crate::sync(
        store,
        UnboundedReceiverStream::new(events),
        watch,
    ));

    tx.send(Ok(watcher::Event::Init)).unwrap();
    tx.send(Ok(watcher::Event::InitApply(mk_obj("Pod", "pod-0", "uid-0", "1"))))
        .unwrap();
    tx.send(Ok(watcher::Event::InitApply(mk_obj("Pod", "pod-1", "uid-1", "1"))))
        .unwrap();

    // Nothing is published until the list completes.
    assert!(!rx.borrow().is_ready());

    tx.send(Ok(watcher::Event::InitDone)).unwrap();
    time::timeout(time::Duration::from_secs(1), rx.changed())
        .await
        .unwrap()
        .unwrap();
    {
        let snapshot = rx.borrow_and_update().clone();
        assert!(snapshot.is_ready());
        assert_eq!(uids(&snapshot), vec!["uid-0", "uid-1"]);
    }

    drop(tx);
    task.await.unwrap();
}

#[tokio::test]
async fn sync_records_stream_errors_without_clearing() {
    let store = Store::new(pod_gvk());
    let mut rx = store.subscribe();
    let (tx, events) = mpsc::unbounded_channel();
    let (_signal, watch) = drain::channel();
    let task = tokio::spawn(crate::sync(
        store,
        UnboundedReceiverStream::new(events),
        watch,
    ));

    tx.send(Ok(watcher::Event::Apply(mk_obj("Pod", "pod-0", "uid-0", "1"))))
        .unwrap();
    time::timeout(time::Duration::from_secs(1), rx.changed())
        .await
        .unwrap()
        .unwrap();

    tx.send(Err(watcher::Error::WatchError(ErrorResponse {
        status: "Failure".to_string(),
        message: "boom".to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    })))
    .unwrap();
    time::timeout(time::Duration::from_secs(1), rx.changed())
        .await
        .unwrap()
        .unwrap();

    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(uids(&snapshot), vec!["uid-0"], "last-known-good is retained");
    assert!(snapshot.error().is_some());

    drop(tx);
    task.await.unwrap();
}

#[tokio::test]
async fn scope_reset_cancels_sync_tasks() {
    let cache = StoreCache::new(Scope {
        cluster: "main".to_string(),
        namespace: None,
    });

    let store = Store::new(pod_gvk());
    let mut rx = store.subscribe();
    let (tx, events) = mpsc::unbounded_channel();
    tokio::spawn(crate::sync(
        store,
        UnboundedReceiverStream::new(events),
        cache.drain_watch(),
    ));

    tx.send(Ok(watcher::Event::Apply(mk_obj("Pod", "pod-0", "uid-0", "1"))))
        .unwrap();
    time::timeout(time::Duration::from_secs(1), rx.changed())
        .await
        .unwrap()
        .unwrap();

    // Changing scope drains the cache, which must stop the sync task...
    let cache = cache
        .reset(Scope {
            cluster: "main".to_string(),
            namespace: Some("ns-1".to_string()),
        })
        .await;
    assert!(cache.is_empty());

    // ...so a late event for the stale scope is never applied.
    let late = tx.send(Ok(watcher::Event::Apply(mk_obj("Pod", "pod-1", "uid-1", "1"))));
    assert!(late.is_err(), "the stale subscription must be dropped");
    assert_eq!(uids(&rx.borrow_and_update()), vec!["uid-0"]);
}
