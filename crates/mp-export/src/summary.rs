//! Run Summarizer: per-type sidecar counts plus artifact paths.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use mp_core::enums::TabularStrategy;
use mp_core::responses::RunSummary;
use mp_core::{EntityType, RunContext};
use mp_lake::{ChunkLocator, type_statistics, write_atomic};

use crate::ExportError;
use crate::{JSON_FILE, TEXT_FILE};

/// Collect counts for every type that has a readable sidecar and the paths
/// of the artifacts currently present in `artifact_dir`.
#[must_use]
pub fn build_summary(locator: &ChunkLocator, run: &RunContext, artifact_dir: &Path) -> RunSummary {
    let types: BTreeMap<_, _> = EntityType::ALL
        .into_iter()
        .filter_map(|ty| type_statistics(locator, ty).map(|counts| (ty, counts)))
        .collect();

    let existing = |name: &str| Some(artifact_dir.join(name)).filter(|p| p.is_file());

    RunSummary {
        run_id: run.run_id.clone(),
        types,
        text_output: existing(TEXT_FILE),
        json_output: existing(JSON_FILE),
        tabular_output: [TabularStrategy::Workbook, TabularStrategy::Bundle]
            .into_iter()
            .find_map(|s| existing(s.file_name())),
        output_prefix: run.output_prefix.clone(),
    }
}

/// Write the summary as pretty JSON, atomically.
///
/// # Errors
///
/// Returns [`ExportError`] if serialization or the write fails.
pub fn persist_summary(summary: &RunSummary, target: &Path) -> Result<PathBuf, ExportError> {
    let mut bytes = serde_json::to_vec_pretty(summary)?;
    bytes.push(b'\n');
    Ok(write_atomic(target, &bytes)?)
}
