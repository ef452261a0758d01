//! Export error types.

use mp_core::CoreError;
use mp_lake::LakeError;

/// Errors raised while building a consolidated artifact.
///
/// Every variant is scoped to one artifact: the step that produced it fails,
/// the others still run.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Chunk discovery, decoding, or atomic write failed.
    #[error(transparent)]
    Lake(#[from] LakeError),

    /// I/O error while streaming an artifact.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failed while writing structured output.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Delimited table rendering failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook engine rejected the data.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// An optional engine is not compiled in or not enabled.
    #[error("Export engine unavailable: {0}")]
    EngineUnavailable(&'static str),

    /// Every tabular strategy failed.
    #[error("All tabular strategies failed: {}", .0.join("; "))]
    StrategiesExhausted(Vec<String>),

    /// The run context was rejected.
    #[error(transparent)]
    Core(#[from] CoreError),
}
