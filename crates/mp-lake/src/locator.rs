//! Chunk discovery.
//!
//! Partition chunks are produced by unrelated upstream writers; the locator
//! only finds them. Lookup order for a type:
//! 1. `<root>/<partition>/<type>/` : files with an accepted record extension,
//!    sorted by file name.
//! 2. When that is empty and a fallback root is configured, a recursive walk
//!    of the fallback root for `<partition>/<type>/` folders (chunks the object
//!    store materialised elsewhere), sorted by full path. A locator built for a
//!    run only accepts folders below a directory named after that run (its
//!    `run_id` or the last segment of its `output_prefix`), so sibling runs
//!    sharing the fallback root never leak into each other.
//!
//! Lookups never fail. An absent or unreadable folder is an empty result.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use mp_core::enums::Partition;
use mp_core::{EntityType, RunContext};

use crate::reader::ChunkFormat;

/// File stem reserved for the per-folder statistics sidecar.
pub const STATISTICS_STEM: &str = "statistics";

/// Sidecar file name inside a transformed type folder.
pub const STATISTICS_FILE: &str = "statistics.json";

/// Finds ordered partition chunks for an entity type.
#[derive(Debug, Clone)]
pub struct ChunkLocator {
    root: PathBuf,
    fallback: Option<PathBuf>,
    /// Directory names that mark a fallback folder as this run's. Empty
    /// means unscoped.
    scope: Vec<String>,
}

impl ChunkLocator {
    #[must_use]
    pub const fn new(root: PathBuf, fallback: Option<PathBuf>) -> Self {
        Self {
            root,
            fallback,
            scope: Vec::new(),
        }
    }

    /// Locator over a run's `output_path`, with fallback lookups scoped to
    /// that run.
    #[must_use]
    pub fn for_run(ctx: &RunContext, fallback: Option<PathBuf>) -> Self {
        let mut scope = vec![ctx.run_id.clone()];
        if let Some(tail) = ctx
            .output_prefix
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|tail| !tail.is_empty() && *tail != ctx.run_id)
        {
            scope.push(tail.to_string());
        }
        Self {
            root: ctx.output_path.clone(),
            fallback,
            scope,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ordered chunk paths for one type and partition. Possibly empty.
    #[must_use]
    pub fn chunks(&self, partition: Partition, ty: EntityType) -> Vec<PathBuf> {
        let primary = list_chunks(&self.root.join(partition.as_str()).join(ty.as_str()));
        if !primary.is_empty() {
            return primary;
        }

        let Some(fallback) = &self.fallback else {
            return primary;
        };

        let found = search_fallback(fallback, &self.scope, partition, ty, is_chunk_file);
        if !found.is_empty() {
            tracing::debug!(
                entity = %ty,
                %partition,
                count = found.len(),
                root = %fallback.display(),
                "chunks found under fallback root"
            );
        }
        found
    }

    /// Path of a type's statistics sidecar, if one exists.
    #[must_use]
    pub fn statistics_file(&self, ty: EntityType) -> Option<PathBuf> {
        let primary = self
            .root
            .join(Partition::Transformed.as_str())
            .join(ty.as_str())
            .join(STATISTICS_FILE);
        if primary.is_file() {
            return Some(primary);
        }

        let fallback = self.fallback.as_ref()?;
        search_fallback(fallback, &self.scope, Partition::Transformed, ty, |path| {
            path.file_name().and_then(|n| n.to_str()) == Some(STATISTICS_FILE)
        })
        .into_iter()
        .next()
    }
}

/// Whether a path names a record chunk: accepted extension, not the sidecar.
#[must_use]
pub fn is_chunk_file(path: &Path) -> bool {
    ChunkFormat::from_path(path).is_some()
        && path.file_stem().and_then(|s| s.to_str()) != Some(STATISTICS_STEM)
}

fn list_chunks(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut chunks: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_chunk_file(path))
        .collect();
    chunks.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    chunks
}

fn search_fallback(
    root: &Path,
    scope: &[String],
    partition: Partition,
    ty: EntityType,
    accept: impl Fn(&Path) -> bool,
) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).hidden(false);

    let mut found: Vec<PathBuf> = builder
        .build()
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| {
            in_type_folder(path, partition, ty) && in_scope(root, path, scope) && accept(path)
        })
        .collect();
    found.sort();
    found
}

/// `.../<partition>/<type>/<file>`
fn in_type_folder(path: &Path, partition: Partition, ty: EntityType) -> bool {
    let Some(type_dir) = path.parent() else {
        return false;
    };
    let Some(partition_dir) = type_dir.parent() else {
        return false;
    };
    type_dir.file_name().and_then(|n| n.to_str()) == Some(ty.as_str())
        && partition_dir.file_name().and_then(|n| n.to_str()) == Some(partition.as_str())
}

/// Some directory between the fallback root and `<partition>/` carries one
/// of the scope names.
fn in_scope(root: &Path, path: &Path, scope: &[String]) -> bool {
    if scope.is_empty() {
        return true;
    }
    let Some(above_partition) = path.parent().and_then(Path::parent).and_then(Path::parent) else {
        return false;
    };
    above_partition.strip_prefix(root).is_ok_and(|relative| {
        relative.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| scope.iter().any(|s| s == name))
        })
    })
}
