//! Graph structure and execution passes.

pub mod structure;

pub use structure::{Connection, NodeGraph, RenderHook};
