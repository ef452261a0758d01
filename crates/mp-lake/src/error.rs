//! Lake error types.

use std::path::PathBuf;

/// Errors that can occur while discovering, decoding, or writing partition data.
#[derive(Debug, thiserror::Error)]
pub enum LakeError {
    /// I/O error (chunk reads, temp files, renames).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A chunk or sidecar is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `DuckDB` failed to decode a Parquet chunk.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Object store listing or fetch failed.
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// A chunk element decoded to something other than a JSON object.
    #[error("Record in {path} is not an object")]
    NotAnObject {
        /// Chunk the element came from.
        path: PathBuf,
    },

    /// The file extension is not one of the accepted record formats.
    #[error("Unsupported chunk format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A required configuration section is missing.
    #[error("Not configured: {0}")]
    NotConfigured(String),
}
