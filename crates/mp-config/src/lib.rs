//! # mp-config
//!
//! Layered configuration loading for metaport using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`METAPORT_*` prefix, `__` as separator)
//! 2. Project-level `.metaport/config.toml`
//! 3. User-level `~/.config/metaport/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `METAPORT_EXPORT__ARTIFACTS_DIR` -> `export.artifacts_dir`,
//! `METAPORT_STORAGE__BUCKET_NAME` -> `storage.bucket_name`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use mp_config::MetaportConfig;
//!
//! let config = MetaportConfig::load_with_dotenv().expect("config");
//! println!("artifacts land in {}", config.export.artifacts_dir.display());
//! ```

mod diagram;
mod error;
mod export;
mod storage;

pub use diagram::DiagramConfig;
pub use error::ConfigError;
pub use export::ExportConfig;
pub use storage::StorageConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetaportConfig {
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub diagram: DiagramConfig,
}

impl MetaportConfig {
    /// Load configuration from all sources, using the current directory as
    /// the project root.
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with `project_dir/.metaport/config.toml` as the
    /// project layer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is invalid.
    pub fn load_from(project_dir: &Path) -> Result<Self, ConfigError> {
        let config: Self = Self::figment_in(project_dir).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support from the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction fails or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain rooted at the current directory.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_in(Path::new("."))
    }

    /// Build the figment provider chain with `project_dir` as the project root.
    ///
    /// Public so tests can inspect the figment or add providers on top.
    #[must_use]
    pub fn figment_in(project_dir: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        // Layer 2: Project-local config
        let local_path = project_dir.join(".metaport").join("config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("METAPORT_").split("__"))
    }

    /// Reject values that would make a step unusable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.diagram.max_input_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "diagram.max_input_chars".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.diagram.models.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "diagram.models".into(),
                reason: "at least one model name is required".into(),
            });
        }
        if self.export.artifacts_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.artifacts_dir".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("metaport").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = MetaportConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.storage.is_configured());
        assert!(config.export.workbook);
    }

    #[test]
    fn zero_input_budget_is_invalid() {
        let mut config = MetaportConfig::default();
        config.diagram.max_input_chars = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "diagram.max_input_chars"));
    }

    #[test]
    fn blank_model_list_is_invalid() {
        let mut config = MetaportConfig::default();
        config.diagram.models = vec![" ".into()];
        assert!(config.validate().is_err());
    }
}
