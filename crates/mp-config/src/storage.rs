//! Object storage configuration.
//!
//! Either a local directory acting as the store (`local_root`) or an
//! S3-compatible bucket. `local_root` wins when both are set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default region. S3-compatible services such as R2 accept `auto`.
fn default_region() -> String {
    String::from("auto")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Bucket name.
    #[serde(default)]
    pub bucket_name: String,

    /// Custom endpoint URL. Empty uses the provider default.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    /// Filesystem directory used as the object store.
    #[serde(default)]
    pub local_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            endpoint: String::new(),
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            local_root: PathBuf::new(),
        }
    }
}

impl StorageConfig {
    /// Whether a local directory store is configured.
    #[must_use]
    pub fn is_local(&self) -> bool {
        !self.local_root.as_os_str().is_empty()
    }

    /// Whether the S3 settings have the minimum required fields.
    #[must_use]
    pub fn is_s3_configured(&self) -> bool {
        !self.bucket_name.is_empty()
            && !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
    }

    /// Whether any store is usable.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.is_local() || self.is_s3_configured()
    }
}
