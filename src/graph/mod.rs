// src/graph/mod.rs
pub mod adjacency;
pub mod components;

pub use adjacency::{AdjacencyMap, DiGraph, Orientation, UnGraph};
pub use components::{strongly_connected_components, Condensation};
