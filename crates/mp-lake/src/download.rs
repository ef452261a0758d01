//! Object-store prefix download.
//!
//! Materialises remote partition files under a local directory before the
//! consolidators read them. Callers treat a failed download as "nothing new
//! locally" and carry on with whatever is already on disk.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use mp_config::StorageConfig;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;

use crate::LakeError;

/// Copies every object under a remote prefix to a local directory.
pub trait PrefixDownloader {
    /// Download objects under `source` into `destination`, preserving their
    /// key relative to the prefix. Returns the number of files written.
    fn download_prefix(
        &self,
        source: &str,
        destination: &Path,
    ) -> impl Future<Output = Result<usize, LakeError>> + Send;
}

/// [`PrefixDownloader`] over any `object_store` backend.
#[derive(Debug, Clone)]
pub struct ObjectStoreDownloader {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreDownloader {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Build the backend the storage config describes.
    ///
    /// # Errors
    ///
    /// Returns [`LakeError::NotConfigured`] when neither a local root nor S3
    /// credentials are set, or [`LakeError::ObjectStore`] if the builder rejects
    /// the settings.
    pub fn from_config(config: &StorageConfig) -> Result<Self, LakeError> {
        if config.is_local() {
            std::fs::create_dir_all(&config.local_root)?;
            let store = LocalFileSystem::new_with_prefix(&config.local_root)?;
            return Ok(Self::new(Arc::new(store)));
        }

        if !config.is_s3_configured() {
            return Err(LakeError::NotConfigured("storage".to_string()));
        }

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket_name)
            .with_region(&config.region)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key);
        if !config.endpoint.is_empty() {
            builder = builder
                .with_endpoint(&config.endpoint)
                .with_allow_http(config.endpoint.starts_with("http://"));
        }
        Ok(Self::new(Arc::new(builder.build()?)))
    }
}

impl PrefixDownloader for ObjectStoreDownloader {
    async fn download_prefix(&self, source: &str, destination: &Path) -> Result<usize, LakeError> {
        let prefix = ObjectPath::from(source.trim_matches('/'));
        let mut listing = self.store.list(Some(&prefix));
        let mut written = 0usize;

        while let Some(meta) = listing.next().await {
            let meta = meta?;
            let Some(target) = local_target(&prefix, &meta.location, destination) else {
                continue;
            };

            let bytes = self.store.get(&meta.location).await?.bytes().await?;
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, &bytes).await?;
            written += 1;
        }

        tracing::info!(
            prefix = %prefix,
            destination = %destination.display(),
            files = written,
            "downloaded object-store prefix"
        );
        Ok(written)
    }
}

/// Map an object key under `prefix` to a path under `destination`.
/// Keys that equal the prefix or carry traversal segments are skipped.
fn local_target(prefix: &ObjectPath, location: &ObjectPath, destination: &Path) -> Option<PathBuf> {
    let relative = location
        .as_ref()
        .strip_prefix(prefix.as_ref())?
        .trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    let mut target = destination.to_path_buf();
    for segment in relative.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return None;
        }
        target.push(segment);
    }
    Some(target)
}
