//! Export steps bound to one run.
//!
//! Each step is independent and retryable on its own. [`Exporter::run_exit_steps`]
//! runs them all with failures isolated per step, so one broken artifact
//! never blocks the others or the summary.

use std::path::{Path, PathBuf};

use mp_config::ExportConfig;
use mp_core::RunContext;
use mp_core::responses::{
    ExitStepsResponse, JsonOutputResponse, RunSummary, StepStatus, SummaryResponse, TabularOutputResponse,
    TextOutputResponse,
};
use mp_lake::{ChunkLocator, PrefixDownloader};

use crate::summary::{build_summary, persist_summary};
use crate::tabular::{TabularExport, default_sinks, write_tabular};
use crate::{ExportError, JSON_FILE, SUMMARY_FILE, TEXT_FILE, write_structured_document, write_text_report};

/// A validated run plus where its inputs and artifacts live.
#[derive(Debug, Clone)]
pub struct Exporter {
    run: RunContext,
    locator: ChunkLocator,
    artifact_dir: PathBuf,
    workbook: bool,
}

impl Exporter {
    #[must_use]
    pub fn new(run: RunContext, config: &ExportConfig) -> Self {
        let locator = ChunkLocator::for_run(&run, config.fallback());
        let artifact_dir = run.artifact_dir(&config.artifacts_dir);
        Self {
            run,
            locator,
            artifact_dir,
            workbook: config.workbook,
        }
    }

    #[must_use]
    pub const fn run(&self) -> &RunContext {
        &self.run
    }

    #[must_use]
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    #[must_use]
    pub fn text_path(&self) -> PathBuf {
        self.artifact_dir.join(TEXT_FILE)
    }

    #[must_use]
    pub fn json_path(&self) -> PathBuf {
        self.artifact_dir.join(JSON_FILE)
    }

    #[must_use]
    pub fn summary_path(&self) -> PathBuf {
        self.artifact_dir.join(SUMMARY_FILE)
    }

    /// Build the tab-separated text report.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the report could not be written.
    pub fn write_text_output(&self) -> Result<TextOutputResponse, ExportError> {
        let report = write_text_report(&self.locator, &self.text_path())?;
        Ok(TextOutputResponse {
            written: report.written(),
            sections: report.sections,
            record_count: report.record_count(),
            path: report.path,
        })
    }

    /// Build the structured document.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the document could not be written.
    pub fn write_json_output(&self) -> Result<JsonOutputResponse, ExportError> {
        let report = write_structured_document(&self.locator, &self.json_path(), &self.run)?;
        Ok(JsonOutputResponse {
            path: report.path,
            record_counts: report.record_counts,
            repaired: report.repaired,
        })
    }

    /// Build the workbook, or the bundle if the workbook fails.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::StrategiesExhausted`] if every strategy failed.
    pub fn write_tabular_output(&self) -> Result<TabularOutputResponse, ExportError> {
        let report = self.text_path();
        let export = TabularExport::collect(
            &self.locator,
            &self.run.run_id,
            &self.run.output_prefix,
            Some(&report),
        );
        write_tabular(&default_sinks(self.workbook), &export, &self.artifact_dir)
    }

    /// Aggregate sidecar counts and the artifact paths present on disk and
    /// persist them. Persistence failure is logged and reported as a missing
    /// `path`.
    #[must_use]
    pub fn summarize_outputs(&self) -> SummaryResponse {
        self.persist(build_summary(&self.locator, &self.run, &self.artifact_dir))
    }

    /// Run json, text, tabular and summary in that order, isolating failures.
    /// The summary lists only the artifacts this invocation produced: a step
    /// that failed leaves its path empty even if an older file is still there.
    #[must_use]
    pub fn run_exit_steps(&self) -> ExitStepsResponse {
        let json = step("json", || self.write_json_output());
        let text = step("text", || self.write_text_output());
        let tabular = step("tabular", || self.write_tabular_output());

        let mut summary = build_summary(&self.locator, &self.run, &self.artifact_dir);
        summary.json_output = json.result().map(|r| r.path.clone());
        summary.text_output = text.result().map(|r| r.path.clone());
        summary.tabular_output = tabular.result().map(|r| r.path.clone());
        let summary = StepStatus::Completed {
            result: self.persist(summary),
        };

        ExitStepsResponse {
            run_id: self.run.run_id.clone(),
            downloaded: 0,
            json,
            text,
            tabular,
            summary,
        }
    }

    /// Materialise the run's remote prefix under `output_path`, then run
    /// every exit step. A failed download leaves whatever is already on disk.
    pub async fn download_and_run<D: PrefixDownloader>(&self, downloader: &D) -> ExitStepsResponse {
        let downloaded = match downloader
            .download_prefix(&self.run.output_prefix, &self.run.output_path)
            .await
        {
            Ok(count) => count,
            Err(error) => {
                tracing::warn!(
                    prefix = %self.run.output_prefix,
                    %error,
                    "download failed; exporting local partitions only"
                );
                0
            }
        };

        ExitStepsResponse {
            downloaded,
            ..self.run_exit_steps()
        }
    }

    fn persist(&self, summary: RunSummary) -> SummaryResponse {
        let path = match persist_summary(&summary, &self.summary_path()) {
            Ok(path) => Some(path),
            Err(error) => {
                tracing::warn!(run_id = %self.run.run_id, %error, "could not persist run summary");
                None
            }
        };
        SummaryResponse { summary, path }
    }
}

fn step<T>(name: &str, f: impl FnOnce() -> Result<T, ExportError>) -> StepStatus<T> {
    match f() {
        Ok(result) => StepStatus::Completed { result },
        Err(error) => {
            tracing::error!(step = name, %error, "export step failed");
            StepStatus::Failed {
                error: error.to_string(),
            }
        }
    }
}
