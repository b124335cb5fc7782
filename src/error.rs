// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrankError {
    #[error("Need at least k + 1 = {} distinct points, got {points}", .k + 1)]
    TooFewPoints { points: usize, k: usize },

    #[error("Neighbour count must be at least 1, got {0}")]
    InvalidNeighborCount(usize),

    #[error("Can't find components in an empty graph")]
    EmptyGraph,

    #[error("Self-loops are not allowed in this graph")]
    SelfLoop,

    #[error("Point is not part of this graph")]
    UnknownPoint,

    #[error("Point listed more than once")]
    DuplicatePoint,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PrankError>;
