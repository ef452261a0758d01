//! Validated run context passed by value into every export step.
//!
//! The workflow engine hands each step a loose argument map. It is validated
//! once here, before any I/O, so steps never re-check field presence.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{EntityType, Partition};
use crate::errors::CoreError;

/// Identity and locations of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunContext {
    /// Local root holding the `raw/` and `transformed/` partition folders.
    pub output_path: PathBuf,
    /// Remote object-store prefix the partitions were uploaded under.
    pub output_prefix: String,
    /// Opaque identifier naming this execution; artifacts are namespaced by it.
    pub run_id: String,
}

impl RunContext {
    /// Build a context from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingField`] when a field is blank and
    /// [`CoreError::Validation`] when `run_id` cannot be used as a directory name.
    pub fn new(
        output_path: impl Into<PathBuf>,
        output_prefix: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let output_path = output_path.into();
        let output_prefix = output_prefix.into();
        let run_id = run_id.into();

        if output_path.as_os_str().is_empty() {
            return Err(CoreError::MissingField {
                field: "output_path",
            });
        }
        if output_prefix.trim().is_empty() {
            return Err(CoreError::MissingField {
                field: "output_prefix",
            });
        }
        if run_id.trim().is_empty() {
            return Err(CoreError::MissingField { field: "run_id" });
        }
        validate_run_id(&run_id)?;

        Ok(Self {
            output_path,
            output_prefix,
            run_id,
        })
    }

    /// Build a context from the workflow engine's argument map.
    ///
    /// `run_id` may be supplied as `workflow_id` by engines that only know the
    /// workflow identity.
    ///
    /// # Errors
    ///
    /// Fails fast with [`CoreError::MissingField`] if any required field is
    /// missing, not a string, or blank.
    pub fn from_args(args: &Value) -> Result<Self, CoreError> {
        let Some(map) = args.as_object() else {
            return Err(CoreError::Validation(
                "run arguments must be a JSON object".to_string(),
            ));
        };

        let field = |name: &'static str| -> Option<&str> {
            map.get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let output_path = field("output_path").ok_or(CoreError::MissingField {
            field: "output_path",
        })?;
        let output_prefix = field("output_prefix").ok_or(CoreError::MissingField {
            field: "output_prefix",
        })?;
        let run_id = field("run_id")
            .or_else(|| field("workflow_id"))
            .ok_or(CoreError::MissingField { field: "run_id" })?;

        Self::new(output_path, output_prefix, run_id)
    }

    /// Partition folder for one entity type: `<output_path>/<partition>/<type>`.
    #[must_use]
    pub fn partition_dir(&self, partition: Partition, ty: EntityType) -> PathBuf {
        self.output_path.join(partition.as_str()).join(ty.as_str())
    }

    /// Artifact directory for this run beneath `artifacts_root`.
    #[must_use]
    pub fn artifact_dir(&self, artifacts_root: &Path) -> PathBuf {
        artifacts_root.join(&self.run_id)
    }
}

fn validate_run_id(run_id: &str) -> Result<(), CoreError> {
    if run_id == "." || run_id == ".." || run_id.contains(['/', '\\']) {
        return Err(CoreError::Validation(format!(
            "run id '{run_id}' is not a valid directory name"
        )));
    }
    Ok(())
}
