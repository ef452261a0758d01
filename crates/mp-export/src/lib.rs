//! # mp-export
//!
//! Export consolidation engine for metaport.
//!
//! Reads the partitioned per-type chunks of one run (through `mp-lake`) and
//! produces the consolidated artifacts under `<artifacts_dir>/<run_id>/`:
//!
//! - `output.txt`: tab-separated report with `=== TYPE ===` sections ([`text`])
//! - `output.json`: one document keyed by entity type plus metadata ([`structured`])
//! - `output.xlsx` or `output.tar.gz`: one table per type ([`tabular`])
//! - `summary.json`: sidecar counts and artifact paths ([`summary`])
//!
//! Every artifact replaces its previous version atomically. Steps are
//! independent: [`Exporter`] exposes one method per step and runs them all
//! with failures isolated.

pub mod cell;
pub mod document;
pub mod error;
pub mod exporter;
pub mod structured;
pub mod summary;
pub mod table;
pub mod tabular;
pub mod text;

pub use document::{ArrayWriter, JsonDocumentWriter};
pub use error::ExportError;
pub use exporter::Exporter;
pub use structured::{StructuredReport, ensure_closed, write_structured_document};
pub use summary::{build_summary, persist_summary};
pub use table::{Table, build_table};
pub use tabular::{BundleSink, TabularExport, TabularSink, WorkbookSink, write_tabular};
pub use text::{TextReport, write_text_report};

/// Text report file name inside a run's artifact directory.
pub const TEXT_FILE: &str = "output.txt";
/// Structured document file name.
pub const JSON_FILE: &str = "output.json";
/// Run summary file name.
pub const SUMMARY_FILE: &str = "summary.json";
