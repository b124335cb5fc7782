//! k-nearest-neighbour descent under arbitrary ranking systems, local
//! cohesion between points, and clustering by strong components.

pub mod cli;
pub mod cohesion;
pub mod config;
pub mod descent;
pub mod error;
pub mod exit;
pub mod graph;
pub mod pipeline;
pub mod random;
pub mod ranking;
pub mod report;
pub mod simplex;
