//! Text Consolidator: every entity type into one tab-separated report.
//!
//! Output shape:
//!
//! ```text
//! === TABLE ===
//! id	name
//! 1	a
//!
//! === COLUMN ===
//! ...
//! ```
//!
//! The header row comes from the first non-empty chunk of a type; later
//! records are projected onto it. Types without records get no section.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use mp_core::record::columns;
use mp_core::{EntityType, Record};
use mp_lake::{AtomicFile, ChunkCursor, ChunkLocator};

use crate::ExportError;
use crate::cell::{cell_text, escape_tsv};

/// What the text consolidator wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReport {
    pub path: PathBuf,
    pub sections: u32,
    pub record_counts: BTreeMap<EntityType, u64>,
}

impl TextReport {
    /// Whether any section was written.
    #[must_use]
    pub const fn written(&self) -> bool {
        self.sections > 0
    }

    #[must_use]
    pub fn record_count(&self) -> u64 {
        self.record_counts.values().sum()
    }
}

/// Stream every type's records into `target`, replacing it atomically.
///
/// At most one chunk is held in memory. A report with no sections is still
/// committed (as an empty file) so a rerun over emptied input does not leave
/// stale sections behind.
///
/// # Errors
///
/// Returns [`ExportError`] on any write failure; the previous report at
/// `target` is left untouched.
pub fn write_text_report(locator: &ChunkLocator, target: &Path) -> Result<TextReport, ExportError> {
    let mut out = AtomicFile::create(target)?;
    let mut sections = 0u32;
    let mut record_counts = BTreeMap::new();

    for ty in EntityType::ALL {
        let mut header: Option<Vec<String>> = None;
        let mut count = 0u64;

        for chunk in ChunkCursor::new(locator, ty) {
            if header.is_none() {
                if sections > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "=== {} ===", ty.section_title())?;
                let first = columns(&chunk.records[0]);
                write_line(&mut out, first.iter().map(|c| escape_tsv(c)))?;
                sections += 1;
                header = Some(first);
            }
            let header_row = header.as_deref().unwrap_or_default();

            for record in &chunk.records {
                write_row(&mut out, header_row, record)?;
                count += 1;
            }
        }

        if header.is_some() {
            tracing::debug!(entity = %ty, records = count, "text section written");
            record_counts.insert(ty, count);
        }
    }

    let path = out.commit()?;
    tracing::info!(path = %path.display(), sections, "text report written");
    Ok(TextReport {
        path,
        sections,
        record_counts,
    })
}

fn write_row(out: &mut impl Write, columns: &[String], record: &Record) -> std::io::Result<()> {
    write_line(
        out,
        columns
            .iter()
            .map(|c| cell_text(record.get(c)))
            .map(|cell| escape_tsv(&cell).into_owned()),
    )
}

fn write_line<S: AsRef<str>>(out: &mut impl Write, cells: impl Iterator<Item = S>) -> std::io::Result<()> {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.write_all(b"\t")?;
        }
        out.write_all(cell.as_ref().as_bytes())?;
    }
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn records_projected_onto_first_header() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "transformed/column/chunk-0.json",
            r#"[{"name":"id","type":"int"}]"#,
        );
        write(
            dir.path(),
            "transformed/column/chunk-1.json",
            r#"[{"type":"text","name":"note\tline","extra":1},{"name":null}]"#,
        );

        let locator = ChunkLocator::new(dir.path().to_path_buf(), None);
        let target = dir.path().join("out/output.txt");
        let report = write_text_report(&locator, &target).unwrap();

        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "=== COLUMN ===\nname\ttype\nid\tint\nnote\\tline\ttext\n\t\n"
        );
        assert_eq!(report.sections, 1);
        assert_eq!(report.record_count(), 3);
    }

    #[test]
    fn sections_separated_by_blank_line_in_type_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "transformed/table/chunk-0.jsonl", "{\"id\":1}\n");
        write(dir.path(), "raw/database/chunk-0.jsonl", "{\"db\":\"main\"}\n");

        let locator = ChunkLocator::new(dir.path().to_path_buf(), None);
        let target = dir.path().join("output.txt");
        write_text_report(&locator, &target).unwrap();

        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "=== DATABASE ===\ndb\nmain\n\n=== TABLE ===\nid\n1\n"
        );
    }

    #[test]
    fn empty_input_commits_empty_report() {
        let dir = TempDir::new().unwrap();
        let locator = ChunkLocator::new(dir.path().join("missing"), None);
        let target = dir.path().join("output.txt");
        std::fs::write(&target, "stale").unwrap();

        let report = write_text_report(&locator, &target).unwrap();
        assert!(!report.written());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "");
    }
}
