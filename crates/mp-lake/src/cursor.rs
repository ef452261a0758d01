//! Per-type chunk iteration with the transformed-then-raw source preference.
//!
//! Every consolidator reads a type through [`ChunkCursor`]: transformed
//! chunks first; only if none of them yields a record does the cursor move
//! on to the raw chunks of that same type. At most one chunk's records are
//! held at a time. Corrupt chunks are logged and skipped.

use std::collections::VecDeque;
use std::path::PathBuf;

use mp_core::enums::Partition;
use mp_core::{EntityType, Record};

use crate::locator::ChunkLocator;
use crate::reader::{ChunkLoad, load_chunk};

/// One decoded, non-empty chunk.
#[derive(Debug)]
pub struct LoadedChunk {
    pub path: PathBuf,
    pub partition: Partition,
    pub records: Vec<Record>,
}

/// Iterator over the non-empty chunks of one entity type.
pub struct ChunkCursor<'a> {
    locator: &'a ChunkLocator,
    ty: EntityType,
    partition: Partition,
    pending: VecDeque<PathBuf>,
    yielded: bool,
    skipped: usize,
}

impl<'a> ChunkCursor<'a> {
    #[must_use]
    pub fn new(locator: &'a ChunkLocator, ty: EntityType) -> Self {
        let pending = locator.chunks(Partition::Transformed, ty).into();
        Self {
            locator,
            ty,
            partition: Partition::Transformed,
            pending,
            yielded: false,
            skipped: 0,
        }
    }

    /// Number of corrupt chunks skipped so far.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for ChunkCursor<'_> {
    type Item = LoadedChunk;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(path) = self.pending.pop_front() {
                match load_chunk(&path) {
                    ChunkLoad::Records(records) => {
                        self.yielded = true;
                        tracing::debug!(
                            entity = %self.ty,
                            partition = %self.partition,
                            path = %path.display(),
                            records = records.len(),
                            "chunk loaded"
                        );
                        return Some(LoadedChunk {
                            path,
                            partition: self.partition,
                            records,
                        });
                    }
                    ChunkLoad::Empty => {
                        tracing::debug!(path = %path.display(), "chunk is empty");
                    }
                    ChunkLoad::Corrupt(error) => {
                        self.skipped += 1;
                        tracing::warn!(
                            entity = %self.ty,
                            path = %path.display(),
                            %error,
                            "skipping unreadable chunk"
                        );
                    }
                }
                continue;
            }

            if self.partition == Partition::Transformed && !self.yielded {
                self.partition = Partition::Raw;
                self.pending = self.locator.chunks(Partition::Raw, self.ty).into();
                if self.pending.is_empty() {
                    return None;
                }
                tracing::debug!(entity = %self.ty, "no transformed records; falling back to raw chunks");
                continue;
            }

            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn ids(chunks: Vec<LoadedChunk>) -> Vec<i64> {
        chunks
            .into_iter()
            .flat_map(|c| c.records)
            .map(|r| r["id"].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn transformed_wins_over_raw() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "transformed/table/chunk-0.jsonl", "{\"id\":1}\n");
        write(dir.path(), "raw/table/chunk-0.jsonl", "{\"id\":99}\n");

        let locator = ChunkLocator::new(dir.path().to_path_buf(), None);
        let chunks: Vec<_> = ChunkCursor::new(&locator, EntityType::Table).collect();
        assert!(chunks.iter().all(|c| c.partition == Partition::Transformed));
        assert_eq!(ids(chunks), vec![1]);
    }

    #[test]
    fn raw_used_when_transformed_yields_nothing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "transformed/table/chunk-0.jsonl", "");
        write(dir.path(), "transformed/table/chunk-1.jsonl", "{broken");
        write(dir.path(), "raw/table/chunk-0.jsonl", "{\"id\":5}\n");
        write(dir.path(), "raw/table/chunk-1.jsonl", "{\"id\":6}\n");
        write(dir.path(), "raw/column/chunk-0.jsonl", "{\"id\":7}\n");

        let locator = ChunkLocator::new(dir.path().to_path_buf(), None);
        let mut cursor = ChunkCursor::new(&locator, EntityType::Table);
        let chunks: Vec<_> = cursor.by_ref().collect();
        assert_eq!(cursor.skipped(), 1);
        assert!(chunks.iter().all(|c| c.partition == Partition::Raw));
        assert_eq!(ids(chunks), vec![5, 6]);
    }

    #[test]
    fn corrupt_chunk_does_not_stop_the_merge() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "transformed/index/chunk-0.jsonl", "{\"id\":1}\n");
        write(dir.path(), "transformed/index/chunk-1.jsonl", "not json at all");
        write(dir.path(), "transformed/index/chunk-2.jsonl", "{\"id\":3}\n");

        let locator = ChunkLocator::new(dir.path().to_path_buf(), None);
        let mut cursor = ChunkCursor::new(&locator, EntityType::Index);
        let chunks: Vec<_> = cursor.by_ref().collect();
        assert_eq!(ids(chunks), vec![1, 3]);
        assert_eq!(cursor.skipped(), 1);
    }

    #[test]
    fn type_without_chunks_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let locator = ChunkLocator::new(dir.path().to_path_buf(), None);
        assert_eq!(ChunkCursor::new(&locator, EntityType::Relationship).count(), 0);
    }
}
