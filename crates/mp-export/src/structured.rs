//! Structured Consolidator: one JSON document keyed by entity type.
//!
//! Every type key is always present, in fixed order, followed by a
//! `metadata` entry. Records are streamed one chunk at a time through
//! [`JsonDocumentWriter`] into an [`AtomicFile`].

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use mp_core::{EntityType, RunContext};
use mp_lake::{AtomicFile, ChunkCursor, ChunkLocator};
use serde::Serialize;
use serde_json::Value;

use crate::ExportError;
use crate::document::JsonDocumentWriter;

/// Bytes inspected by [`ensure_closed`].
const TAIL_BYTES: u64 = 64;

/// What the structured consolidator wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredReport {
    pub path: PathBuf,
    pub record_counts: BTreeMap<EntityType, u64>,
    pub repaired: bool,
}

#[derive(Serialize)]
struct DocumentMetadata<'a> {
    run_id: &'a str,
    output_prefix: &'a str,
    generated_at: String,
    record_counts: &'a BTreeMap<EntityType, u64>,
}

/// Stream every type into `target` and replace it atomically.
///
/// # Errors
///
/// Returns [`ExportError`] if writing or committing fails; the previous
/// document is then left untouched.
pub fn write_structured_document(
    locator: &ChunkLocator,
    target: &Path,
    run: &RunContext,
) -> Result<StructuredReport, ExportError> {
    let mut doc = JsonDocumentWriter::new(AtomicFile::create(target)?)?;
    let mut record_counts = BTreeMap::new();

    for ty in EntityType::ALL {
        let written = doc.section(ty.as_str(), |array| {
            for chunk in ChunkCursor::new(locator, ty) {
                for record in chunk.records {
                    array.push(&Value::Object(record))?;
                }
            }
            Ok(())
        })?;
        record_counts.insert(ty, written);
    }

    let metadata = DocumentMetadata {
        run_id: &run.run_id,
        output_prefix: &run.output_prefix,
        generated_at: chrono::Utc::now().to_rfc3339(),
        record_counts: &record_counts,
    };
    let path = doc.finish(&metadata)?.commit()?;
    let repaired = verify_tail(&path);

    tracing::info!(
        path = %path.display(),
        records = record_counts.values().sum::<u64>(),
        "structured document written"
    );
    Ok(StructuredReport {
        path,
        record_counts,
        repaired,
    })
}

/// [`ensure_closed`] on a document that is already committed. An I/O error is
/// logged and reported as "no repair": the step has still produced its output.
fn verify_tail(path: &Path) -> bool {
    ensure_closed(path).unwrap_or_else(|error| {
        tracing::warn!(path = %path.display(), %error, "could not verify document tail");
        false
    })
}

/// Check that the document's last non-whitespace byte closes the object and
/// append closing punctuation if it does not. Returns whether a repair was
/// made.
///
/// [`JsonDocumentWriter`] always closes what it opens, so this only fires on
/// documents produced some other way.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the file cannot be read or appended to.
pub fn ensure_closed(path: &Path) -> Result<bool, ExportError> {
    let mut file = OpenOptions::new().read(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(TAIL_BYTES)))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;

    let patch: &[u8] = match tail.trim_ascii_end().last() {
        Some(b'}') => return Ok(false),
        Some(b']') => b"}\n",
        Some(_) => b"]}\n",
        None => b"{}\n",
    };

    tracing::warn!(
        path = %path.display(),
        patch = %String::from_utf8_lossy(patch).trim_end(),
        "structured document was not closed; appending closing punctuation"
    );
    file.write_all(patch)?;
    file.sync_all()?;
    Ok(true)
}
