use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    #[error("failed to read report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no candidate models configured")]
    NoModels,

    #[error("model {model} failed: {message}")]
    Generator { model: String, message: String },

    #[error("all candidate models failed: {}", .0.join("; "))]
    AllModelsFailed(Vec<String>),

    #[error("invalid {kind} '{value}'")]
    InvalidValue { kind: &'static str, value: String },
}
