//! Step response types returned to the workflow engine and printed by `mpt`.
//!
//! Each export step returns one small record. `RunSummary` is also the shape
//! persisted as `summary.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{EntityType, TabularStrategy};

/// Response from the text consolidation step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TextOutputResponse {
    /// Whether any section was written. `false` means no type had records.
    pub written: bool,
    /// Final report path; present even when the report is empty.
    pub path: PathBuf,
    pub sections: u32,
    pub record_count: u64,
}

/// Response from the structured consolidation step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct JsonOutputResponse {
    pub path: PathBuf,
    pub record_counts: BTreeMap<EntityType, u64>,
    /// Whether the post-write tail check had to append closing punctuation.
    pub repaired: bool,
}

/// Response from the tabular export step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TabularOutputResponse {
    pub strategy: TabularStrategy,
    pub path: PathBuf,
}

/// Per-type counts read from a statistics sidecar.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TypeCounts {
    #[serde(default)]
    pub total_record_count: u64,
    #[serde(default)]
    pub chunk_count: u64,
}

/// Aggregated status document for one run (`summary.json`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: String,
    /// Types with a statistics sidecar. Types without one are omitted.
    pub types: BTreeMap<EntityType, TypeCounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_output: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_output: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabular_output: Option<PathBuf>,
    pub output_prefix: String,
}

/// Response from the summary step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SummaryResponse {
    pub summary: RunSummary,
    /// Where the summary was persisted; `None` when persistence failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Outcome of one fault-isolated step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus<T> {
    Completed { result: T },
    Failed { error: String },
}

impl<T> StepStatus<T> {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    #[must_use]
    pub const fn result(&self) -> Option<&T> {
        match self {
            Self::Completed { result } => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

/// Response from running every exit step of a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ExitStepsResponse {
    pub run_id: String,
    /// Files materialised from the object store before the steps ran.
    pub downloaded: usize,
    pub json: StepStatus<JsonOutputResponse>,
    pub text: StepStatus<TextOutputResponse>,
    pub tabular: StepStatus<TabularOutputResponse>,
    pub summary: StepStatus<SummaryResponse>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn summary_omits_absent_paths() {
        let summary = RunSummary {
            run_id: "r".into(),
            types: BTreeMap::from([(
                EntityType::Table,
                TypeCounts {
                    total_record_count: 3,
                    chunk_count: 1,
                },
            )]),
            text_output: Some(PathBuf::from("/out/r/output.txt")),
            json_output: None,
            tabular_output: None,
            output_prefix: "prefix".into(),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            json!({
                "run_id": "r",
                "types": {"table": {"total_record_count": 3, "chunk_count": 1}},
                "text_output": "/out/r/output.txt",
                "output_prefix": "prefix"
            })
        );

        let back: RunSummary = serde_json::from_value(value).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn step_status_is_tagged() {
        let failed: StepStatus<TabularOutputResponse> = StepStatus::Failed {
            error: "disk full".into(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"status": "failed", "error": "disk full"})
        );
        assert!(!failed.is_completed());
        assert!(failed.result().is_none());
    }

    #[test]
    fn summary_schema_generates() {
        let schema = serde_json::to_value(schemars::schema_for!(RunSummary)).unwrap();
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("types"));
        assert!(props.contains_key("output_prefix"));
    }
}
