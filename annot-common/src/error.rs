//! Common error types for the annotation engine

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for annotation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the engine and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or missing startup configuration (fatal)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Side-file exists but could not be parsed (fatal at startup)
    #[error("Failed to load metadata from {path}: {reason}")]
    MetadataLoad { path: PathBuf, reason: String },

    /// Sample index outside the group's sample list
    #[error("Index out of range: {index} (group {group} has {len} samples)")]
    IndexOutOfRange {
        group: String,
        index: i64,
        len: usize,
    },

    /// Output file is bound to another group
    #[error("Output file locked to group {locked}.")]
    LockConflict { locked: String },

    /// Episode id that collides with the reserved lock key
    #[error("Episode id {0:?} is reserved")]
    ReservedEpisodeId(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
