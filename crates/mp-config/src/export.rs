//! Export path configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_output_root() -> PathBuf {
    PathBuf::from("./local/tmp/artifacts")
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("./output")
}

const fn default_workbook() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    /// Root holding the `raw/` and `transformed/` partition folders.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Secondary root searched recursively when a type's primary folder is
    /// empty. Empty disables the fallback search.
    #[serde(default)]
    pub fallback_root: PathBuf,

    /// Artifacts are written to `<artifacts_dir>/<run_id>/`.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Try the workbook strategy before the compressed bundle.
    #[serde(default = "default_workbook")]
    pub workbook: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            fallback_root: PathBuf::new(),
            artifacts_dir: default_artifacts_dir(),
            workbook: default_workbook(),
        }
    }
}

impl ExportConfig {
    /// The fallback search root, if one is configured.
    #[must_use]
    pub fn fallback(&self) -> Option<PathBuf> {
        if self.fallback_root.as_os_str().is_empty() {
            None
        } else {
            Some(self.fallback_root.clone())
        }
    }
}
