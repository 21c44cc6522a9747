//! Error types for trueno-spacetime
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Harness error types
#[derive(Error, Debug)]
pub enum Error {
    /// Precondition violated by a caller-supplied argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dataset loading error (CSV/Parquet)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Profiling engine failure (fatal, aborts the run)
    #[error("Profiling engine error: {0}")]
    Engine(String),

    /// Heap tracer failed to produce its artifact
    #[error("Memory trace error: {0}\nThe trace artifact may be missing or incomplete.")]
    Trace(String),

    /// Malformed run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
