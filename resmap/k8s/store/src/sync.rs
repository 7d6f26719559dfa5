use crate::store::{Event, Store};
use futures::prelude::*;
use kube::{
    core::{DynamicObject, TypeMeta},
    runtime::watcher,
};

/// Drives one store from a `kube` watcher stream until the stream ends or
/// the scope is drained.
///
/// Events are applied strictly in arrival order. A stream error leaves the
/// collection in its last-known-good state with the error flag raised;
/// retry/backoff lives in the watcher itself, not here. When the drain fires
/// the task exits immediately, so late events for a stale scope are dropped
/// rather than applied.
pub async fn sync<S>(mut store: Store, events: S, drain: drain::Watch)
where
    S: Stream<Item = watcher::Result<watcher::Event<DynamicObject>>>,
{
    let type_meta = TypeMeta {
        api_version: store.gvk().api_version(),
        kind: store.gvk().kind.clone(),
    };

    tokio::pin!(events);
    let shutdown = drain.signaled();
    tokio::pin!(shutdown);

    // Objects received between Init and InitDone, buffered so the collection
    // is replaced atomically.
    let mut relist: Option<Vec<DynamicObject>> = None;

    loop {
        let event = tokio::select! {
            biased;

            _ = &mut shutdown => {
                tracing::debug!(kind = %store.gvk().kind, "Scope drained; stopping sync");
                return;
            }

            event = events.next() => match event {
                Some(event) => event,
                None => {
                    tracing::debug!(kind = %store.gvk().kind, "Watch stream ended");
                    return;
                }
            },
        };

        match event {
            Ok(watcher::Event::Init) => {
                relist = Some(Vec::new());
            }

            Ok(watcher::Event::InitApply(obj)) => {
                let obj = with_types(obj, &type_meta);
                match relist.as_mut() {
                    Some(buffer) => buffer.push(obj),
                    // An InitApply without Init; treat it as a point event
                    // rather than dropping data.
                    None => apply(&mut store, Event::Modified(obj)),
                }
            }

            Ok(watcher::Event::InitDone) => {
                let items = relist.take().unwrap_or_default();
                tracing::debug!(kind = %store.gvk().kind, items = items.len(), "Initialized");
                store.initialize(items, None);
            }

            Ok(watcher::Event::Apply(obj)) => {
                apply(&mut store, Event::Modified(with_types(obj, &type_meta)));
            }

            Ok(watcher::Event::Delete(obj)) => {
                apply(&mut store, Event::Deleted(with_types(obj, &type_meta)));
            }

            Err(error) => {
                tracing::warn!(kind = %store.gvk().kind, %error, "Watch failed");
                store.set_error(error);
            }
        }
    }
}

fn apply(store: &mut Store, event: Event) {
    if let Err(error) = store.apply(event) {
        // Malformed events are dropped; the collection is untouched.
        tracing::warn!(kind = %store.gvk().kind, %error, "Dropping malformed event");
    }
}

/// List/watch payloads frequently omit apiVersion/kind on items; stamp them
/// from the store's GVK so downstream consumers always see typed objects.
fn with_types(mut obj: DynamicObject, type_meta: &TypeMeta) -> DynamicObject {
    if obj.types.is_none() {
        obj.types = Some(type_meta.clone());
    }
    obj
}
