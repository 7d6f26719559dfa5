//! Wires the stores, builder, and render pipeline into a running process.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod map;
mod watch;

pub use self::args::Args;
