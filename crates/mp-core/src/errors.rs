//! Cross-cutting error types for metaport.
//!
//! Domain-specific errors (`LakeError`, `ExportError`, `DiagramError`) live in
//! their respective crates. `mp-cli` converges them through `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any metaport crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required run-context field was absent or blank.
    #[error("Run context is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
