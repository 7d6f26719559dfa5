//! Assembles per-kind snapshots into one directed graph of cluster objects.
//!
//! Every data origin is wrapped in a `GraphSource`: a live store, a static
//! fixture, or a kind discovered at runtime from a CRD. Sources are composed
//! into a tree of `SourceGroup`s for UI toggling. The `GraphBuilder` consumes
//! the node sets of all enabled sources plus a fixed table of relationship
//! rules and produces a deterministic `{nodes, edges}` output:
//!
//! ```text
//! [ Store ] -> [ KindSource ] -\
//! [ Store ] -> [ KindSource ] --> [ GraphBuilder ] -> { nodes, edges }
//! [ fixture ] -> [ FixedSource ] -/      ^
//!                                  relationship rules
//! ```
//!
//! The builder memoizes on input identity: when no enabled source's node
//! array changed, the same output `Arc` comes back, which downstream layout
//! treats as "nothing to do". This is a correctness requirement, not an
//! optimization.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod build;
mod discover;
mod kinds;
mod source;


pub use self::{
    build::GraphBuilder,
    discover::{builtin_tree, crd_gvk, crd_kinds, crd_tree, BuiltinKind, DiscoveredKind, BUILTIN_KINDS},
    source::{FixedSource, GraphSource, KindSource, SourceGroup, SourceSelection, SourceTree},
};
