//! Tabular Export Builder: one table per type, as a workbook or a bundle.
//!
//! Strategies are [`TabularSink`]s tried in order. The first one that
//! succeeds wins and the other strategy's artifact from a previous run is
//! removed, so a run directory holds at most one of them. A sink that fails
//! leaves nothing behind and the next one is tried.

mod bundle;
mod workbook;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mp_core::EntityType;
use mp_core::enums::TabularStrategy;
use mp_core::responses::TabularOutputResponse;
use mp_lake::ChunkLocator;

pub use bundle::{BundleSink, render_csv};
pub use workbook::WorkbookSink;

use crate::ExportError;
use crate::table::{Table, build_table};

/// Everything a sink needs to render one run's tables.
#[derive(Debug, Clone)]
pub struct TabularExport<'a> {
    pub run_id: &'a str,
    pub output_prefix: &'a str,
    pub generated_at: DateTime<Utc>,
    /// One table per type in fixed order; empty types already replaced by
    /// the placeholder.
    pub tables: Vec<(EntityType, Table)>,
    /// Text report to embed, if one exists.
    pub report: Option<&'a Path>,
}

impl<'a> TabularExport<'a> {
    /// Build every type's table from the partitions.
    #[must_use]
    pub fn collect(
        locator: &ChunkLocator,
        run_id: &'a str,
        output_prefix: &'a str,
        report: Option<&'a Path>,
    ) -> Self {
        let tables = EntityType::ALL
            .into_iter()
            .map(|ty| (ty, build_table(locator, ty).or_placeholder()))
            .collect();
        Self {
            run_id,
            output_prefix,
            generated_at: Utc::now(),
            tables,
            report: report.filter(|p| p.is_file()),
        }
    }

    /// Key/value pairs for the informational sheet or entry.
    #[must_use]
    pub fn about(&self) -> Vec<(&'static str, String)> {
        vec![
            ("run_id", self.run_id.to_string()),
            ("output_prefix", self.output_prefix.to_string()),
            ("generated_at", self.generated_at.to_rfc3339()),
            ("tables", self.tables.len().to_string()),
            (
                "note",
                "empty types are shown as a single 'no records' row".to_string(),
            ),
        ]
    }

    /// Plain-text rendering of [`Self::about`] plus per-table row counts.
    #[must_use]
    pub fn readme(&self) -> String {
        let mut text = String::from("metaport tabular export\n\n");
        for (key, value) in self.about() {
            let _ = writeln!(text, "{key}: {value}");
        }
        text.push('\n');
        for (ty, table) in &self.tables {
            let _ = writeln!(text, "tables/{}.csv: {} rows", ty.as_str(), table.rows.len());
        }
        if self.report.is_some() {
            text.push_str("output.txt: text report\n");
        }
        text
    }
}

/// One way of persisting the tables.
pub trait TabularSink {
    fn strategy(&self) -> TabularStrategy;

    /// Write the artifact to `target` atomically and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the artifact could not be written; nothing
    /// is left at `target` from this attempt.
    fn write(&self, export: &TabularExport<'_>, target: &Path) -> Result<PathBuf, ExportError>;
}

/// The configured strategy order: workbook (when enabled), then bundle.
#[must_use]
pub fn default_sinks(workbook: bool) -> Vec<Box<dyn TabularSink>> {
    let mut sinks: Vec<Box<dyn TabularSink>> = Vec::with_capacity(2);
    if workbook {
        sinks.push(Box::new(WorkbookSink));
    }
    sinks.push(Box::new(BundleSink));
    sinks
}

/// Try each sink in order, writing into `artifact_dir`.
///
/// # Errors
///
/// Returns [`ExportError::StrategiesExhausted`] only if every sink fails.
pub fn write_tabular(
    sinks: &[Box<dyn TabularSink>],
    export: &TabularExport<'_>,
    artifact_dir: &Path,
) -> Result<TabularOutputResponse, ExportError> {
    let mut failures = Vec::new();

    for sink in sinks {
        let strategy = sink.strategy();
        let target = artifact_dir.join(strategy.file_name());
        match sink.write(export, &target) {
            Ok(path) => {
                remove_stale(artifact_dir, strategy);
                tracing::info!(%strategy, path = %path.display(), "tabular export written");
                return Ok(TabularOutputResponse { strategy, path });
            }
            Err(error) => {
                tracing::warn!(%strategy, %error, "tabular strategy failed; trying next");
                failures.push(format!("{strategy}: {error}"));
            }
        }
    }

    Err(ExportError::StrategiesExhausted(failures))
}

fn remove_stale(artifact_dir: &Path, kept: TabularStrategy) {
    for strategy in [TabularStrategy::Workbook, TabularStrategy::Bundle] {
        if strategy == kept {
            continue;
        }
        let stale = artifact_dir.join(strategy.file_name());
        match std::fs::remove_file(&stale) {
            Ok(()) => tracing::debug!(path = %stale.display(), "removed stale tabular artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => tracing::warn!(path = %stale.display(), %error, "could not remove stale tabular artifact"),
        }
    }
}
