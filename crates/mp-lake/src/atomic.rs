//! Atomic artifact replacement.
//!
//! Artifacts are written to a temp file beside the target, flushed, synced,
//! and renamed over the target. Readers see either the previous file or the
//! complete new one. Dropping an [`AtomicFile`] without committing removes
//! the temp file and leaves the target untouched.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::LakeError;

/// A pending replacement of `target`.
pub struct AtomicFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    /// Create a temp file in the target's directory, creating the directory
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns [`LakeError::Io`] if the directory or temp file cannot be created.
    pub fn create(target: &Path) -> Result<Self, LakeError> {
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let name = target
            .file_name()
            .map_or_else(|| "artifact".to_string(), |n| n.to_string_lossy().into_owned());
        let temp = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(dir)?;

        Ok(Self {
            target: target.to_path_buf(),
            writer: BufWriter::new(temp),
        })
    }

    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Path of the temp file currently being written.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        self.writer.get_ref().path()
    }

    /// Flush, sync, and rename over the target.
    ///
    /// # Errors
    ///
    /// Returns [`LakeError::Io`] if any step fails; the temp file is removed.
    pub fn commit(self) -> Result<PathBuf, LakeError> {
        let temp = self
            .writer
            .into_inner()
            .map_err(io::IntoInnerError::into_error)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.target).map_err(|e| e.error)?;
        sync_parent(&self.target);
        Ok(self.target)
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Replace `target` with `bytes` atomically.
///
/// # Errors
///
/// Returns [`LakeError::Io`] if the write or rename fails.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<PathBuf, LakeError> {
    let mut file = AtomicFile::create(target)?;
    file.write_all(bytes)?;
    file.commit()
}

/// Make the rename durable. Not every platform can open a directory, so
/// failure here is ignored.
fn sync_parent(target: &Path) {
    if let Some(parent) = target.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn commit_replaces_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("output.txt");
        std::fs::write(&target, "old").unwrap();

        let mut file = AtomicFile::create(&target).unwrap();
        file.write_all(b"new contents").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "old");

        let path = file.commit().unwrap();
        assert_eq!(path, target);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new contents");
        assert_eq!(dir_entries(dir.path()), vec!["output.txt"]);
    }

    #[test]
    fn abandoned_write_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("output.json");
        std::fs::write(&target, "{\"previous\":true}").unwrap();

        {
            let mut file = AtomicFile::create(&target).unwrap();
            file.write_all(b"{\"trunc").unwrap();
            assert!(file.temp_path().exists());
        }

        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "{\"previous\":true}"
        );
        assert_eq!(dir_entries(dir.path()), vec!["output.json"]);
    }

    #[test]
    fn creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("run-1").join("summary.json");
        write_atomic(&target, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{}");
    }
}
