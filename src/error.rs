//! Error types for eval-table
//!
//! Only conditions that abort a whole harvest live here. Per-file problems are
//! [`SkipReason`](crate::record::SkipReason)s and never stop a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// eval-table error types
#[derive(Error, Debug)]
pub enum Error {
    /// Root directory missing or not a directory (checked before any walk)
    #[error("Directory '{}' does not exist", .0.display())]
    RootNotFound(PathBuf),

    /// Discovery pattern could not be built from the root path
    #[error("Invalid discovery pattern: {0}")]
    InvalidPattern(String),

    /// Two distinct raw columns normalize to the same output name
    #[error("Column collision: '{first}' and '{second}' both normalize to '{normalized}'")]
    ColumnCollision {
        /// Normalized name shared by both columns
        normalized: String,
        /// Raw name that claimed the normalized name first
        first: String,
        /// Raw name that collided with it
        second: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error (record batch construction, CSV writing)
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
