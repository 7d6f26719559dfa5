//! Incremental layout and render pipeline.
//!
//! The pipeline hands `{nodes, edges}` plus resolved weights to a pluggable
//! `LayoutEngine` and turns the result into a `Scene`. Layout runs only when
//! the graph's identity changes; a loading frame always yields an empty
//! scene (never a half-populated graph), an engine failure keeps the last
//! good layout on screen, and clicks are forwarded to the caller rather than
//! handled here.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod engine;
mod path;
mod pipeline;
mod tier;

pub use self::{
    engine::{EdgeLayout, EdgeSection, Layout, LayoutEngine, LayoutError, NodeLayout, Point},
    path::{smooth_path, PathCommand},
    pipeline::{Element, Frame, LaidGraph, Pipeline, Scene},
    tier::TierLayout,
};
