//! Error types for eldyn operations.
//!
//! Every fault detected by the core is fatal for the pass that raised it.
//! There is no retry or degraded mode; errors are surfaced to the caller.

use thiserror::Error;

/// Result type alias using eldyn Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during eldyn operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Setup errors: dimension mismatch, unsupported solution mode,
    /// variable time step, missing time step.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Cell with non-positive signed volume (inverted or degenerate).
    #[error("degenerate or inverted cell {cell}: signed volume {volume:e}")]
    DegenerateCell { cell: usize, volume: f64 },

    /// Spatial database query could not be resolved.
    #[error("spatial query failed: {0}")]
    SpatialQuery(String),

    /// Invalid material properties or material setup.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),

    /// Mesh-related errors.
    #[error("mesh error: {0}")]
    Mesh(String),

    /// Missing or mis-sized global field.
    #[error("field error: {0}")]
    Field(String),

    /// Malformed JSON configuration.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
