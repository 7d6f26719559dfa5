//! Per-kind reconciled collections.
//!
//! Each resource kind gets a `Store`: a collection kept consistent with
//! "full list + replayed point events" even though the list and the event
//! stream arrive independently. A store is exclusively owned by one sync
//! task; consumers subscribe to immutable `Snapshot` values through a watch
//! channel and compare snapshot identity to decide whether anything changed.
//!
//! ```text
//! [ watch stream ] -> [ sync task ] -> [ Store ] -> watch<Arc<Snapshot>> -> consumers
//! ```
//!
//! Stores for one cluster/namespace scope live in a `StoreCache`. Changing
//! scope drains the cache, which cancels every sync task so that no event for
//! a stale scope can ever reach a live collection.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod cache;
mod metrics;
mod store;
mod sync;

#[cfg(test)]
mod tests;

pub use self::{
    cache::{Scope, StoreCache},
    metrics::StoreMetrics,
    store::{Event, Snapshot, SnapshotRx, Store, StoreError},
    sync::sync,
};
