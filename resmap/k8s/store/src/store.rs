use crate::metrics::StoreMetrics;
use ahash::AHashMap as HashMap;
use kube::{
    core::{DynamicObject, ErrorResponse, GroupVersionKind},
    ResourceExt,
};
use std::sync::Arc;
use tokio::sync::watch;

/// Receives snapshot updates from a store.
pub type SnapshotRx = watch::Receiver<Arc<Snapshot>>;

/// A point event against one kind's collection, as delivered by the
/// transport.
#[derive(Clone, Debug)]
pub enum Event {
    Added(DynamicObject),
    Modified(DynamicObject),
    Deleted(DynamicObject),
    /// A wire-level error report. Never mutates the collection.
    Error(ErrorResponse),
    /// Any event type the transport did not recognize, carried as its raw
    /// type token. Never mutates the collection.
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("event object has no uid")]
    MissingUid,

    #[error("event object has no kind")]
    MissingKind,
}

/// An immutable view of one kind's collection.
///
/// `items` keeps its identity across publishes that do not change the
/// collection contents (e.g. an error report), so consumers can memoize
/// derived data keyed on the item-array pointer.
#[derive(Clone, Debug)]
pub struct Snapshot {
    items: Arc<[Arc<DynamicObject>]>,
    resource_version: Option<String>,
    ready: bool,
    error: Option<String>,
}

// === impl Snapshot ===

impl Snapshot {
    fn empty() -> Arc<Self> {
        Arc::new(Self {
            items: Vec::new().into(),
            resource_version: None,
            ready: false,
            error: None,
        })
    }

    pub fn items(&self) -> &[Arc<DynamicObject>] {
        &self.items
    }

    /// The item array itself. Its pointer is stable across publishes that do
    /// not change the collection, making it a usable memoization key.
    pub fn items_handle(&self) -> &Arc<[Arc<DynamicObject>]> {
        &self.items
    }

    /// The last-known list-level version token.
    pub fn resource_version(&self) -> Option<&str> {
        self.resource_version.as_deref()
    }

    /// Distinguishes "no data yet" from "zero results".
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The most recent transport/wire error, if any. The collection retains
    /// its last-known-good contents alongside this flag.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn get(&self, uid: &str) -> Option<&Arc<DynamicObject>> {
        self.items
            .iter()
            .find(|obj| obj.uid().as_deref() == Some(uid))
    }
}

/// Reconciles one kind's full list with its live point-event stream.
///
/// Owned by exactly one sync task; all other parties observe it through
/// [`Store::subscribe`].
#[derive(Debug)]
pub struct Store {
    gvk: GroupVersionKind,

    /// Insertion-ordered working copy. At most one entry per uid.
    items: Vec<Arc<DynamicObject>>,
    by_uid: HashMap<String, usize>,

    /// The last item array that was published. Reused on publishes that do
    /// not mutate the collection so its identity stays stable.
    published: Arc<[Arc<DynamicObject>]>,

    resource_version: Option<String>,
    ready: bool,
    error: Option<String>,

    tx: watch::Sender<Arc<Snapshot>>,
    metrics: Option<StoreMetrics>,
}

// === impl Store ===

impl Store {
    pub fn new(gvk: GroupVersionKind) -> Self {
        let (tx, _rx) = watch::channel(Snapshot::empty());
        Self {
            gvk,
            items: Vec::new(),
            by_uid: HashMap::default(),
            published: Vec::new().into(),
            resource_version: None,
            ready: false,
            error: None,
            tx,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: StoreMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    pub fn subscribe(&self) -> SnapshotRx {
        self.tx.subscribe()
    }

    /// Replaces the entire collection from a full list and records the
    /// list-level version token.
    ///
    /// Items without a uid are skipped; a later item with an already-seen uid
    /// replaces the earlier one.
    pub fn initialize(&mut self, items: Vec<DynamicObject>, version: Option<String>) {
        self.items.clear();
        self.by_uid.clear();
        for obj in items.into_iter() {
            let Some(uid) = obj.uid() else {
                tracing::warn!(kind = %self.gvk.kind, name = %obj.name_any(), "Listed object has no uid; skipping");
                continue;
            };
            self.upsert(uid, obj);
        }
        self.resource_version = version;
        self.ready = true;
        self.error = None;
        if let Some(metrics) = &self.metrics {
            metrics.on_reset(&self.gvk.kind, self.items.len());
        }
        self.publish(true);
    }

    /// Applies one point event, in arrival order.
    ///
    /// `Added` is idempotent: a known uid is replaced in place, never
    /// duplicated. `Modified` upserts, appending when the uid is unknown so
    /// that events racing ahead of the initial list are tolerated. `Deleted`
    /// of an absent uid is a no-op. `Error` and unrecognized events never
    /// mutate the collection. Malformed events are rejected without mutating
    /// state; retrying is the transport's concern, not ours.
    pub fn apply(&mut self, event: Event) -> Result<(), StoreError> {
        match event {
            Event::Added(obj) | Event::Modified(obj) => {
                let uid = validated_uid(&obj)?;
                tracing::trace!(kind = %self.gvk.kind, name = %obj.name_any(), %uid, "Upserting");
                self.upsert(uid, obj);
                if let Some(metrics) = &self.metrics {
                    metrics.on_apply(&self.gvk.kind, self.items.len());
                }
                self.publish(true);
            }

            Event::Deleted(obj) => {
                let uid = validated_uid(&obj)?;
                if self.remove(&uid) {
                    tracing::trace!(kind = %self.gvk.kind, %uid, "Removed");
                    if let Some(metrics) = &self.metrics {
                        metrics.on_delete(&self.gvk.kind, self.items.len());
                    }
                    self.publish(true);
                }
            }

            Event::Error(status) => {
                tracing::warn!(kind = %self.gvk.kind, %status.message, "Watch error event");
                self.set_error(status.message);
            }

            Event::Other(kind) => {
                tracing::warn!(kind = %self.gvk.kind, event = %kind, "Unrecognized event type; ignoring");
            }
        }

        Ok(())
    }

    /// Records a transport error alongside the collection. The contents are
    /// left in their last-known-good state.
    pub fn set_error(&mut self, error: impl ToString) {
        self.error = Some(error.to_string());
        if let Some(metrics) = &self.metrics {
            metrics.on_error(&self.gvk.kind);
        }
        self.publish(false);
    }

    fn upsert(&mut self, uid: String, obj: DynamicObject) {
        let obj = Arc::new(obj);
        match self.by_uid.get(&uid) {
            Some(&idx) => self.items[idx] = obj,
            None => {
                self.by_uid.insert(uid, self.items.len());
                self.items.push(obj);
            }
        }
    }

    fn remove(&mut self, uid: &str) -> bool {
        let Some(idx) = self.by_uid.remove(uid) else {
            return false;
        };
        self.items.remove(idx);
        for position in self.by_uid.values_mut() {
            if *position > idx {
                *position -= 1;
            }
        }
        true
    }

    fn publish(&mut self, mutated: bool) {
        if mutated {
            self.published = self.items.clone().into();
        }
        self.tx.send_replace(Arc::new(Snapshot {
            items: self.published.clone(),
            resource_version: self.resource_version.clone(),
            ready: self.ready,
            error: self.error.clone(),
        }));
    }
}

fn validated_uid(obj: &DynamicObject) -> Result<String, StoreError> {
    if obj
        .types
        .as_ref()
        .map(|t| t.kind.is_empty())
        .unwrap_or(true)
    {
        return Err(StoreError::MissingKind);
    }
    obj.uid().ok_or(StoreError::MissingUid)
}
