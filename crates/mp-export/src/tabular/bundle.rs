//! Bundle strategy (`output.tar.gz`): one CSV per type, a README and the
//! text report.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use mp_core::enums::TabularStrategy;
use mp_lake::AtomicFile;

use super::{TabularExport, TabularSink};
use crate::ExportError;
use crate::cell::cell_text;
use crate::table::Table;

#[derive(Debug, Default, Clone, Copy)]
pub struct BundleSink;

impl TabularSink for BundleSink {
    fn strategy(&self) -> TabularStrategy {
        TabularStrategy::Bundle
    }

    fn write(&self, export: &TabularExport<'_>, target: &Path) -> Result<PathBuf, ExportError> {
        write_bundle(export, target, render_csv)
    }
}

/// Build the archive, rendering each table with `render`. A table that fails
/// to render is replaced by an error row; the rest of the bundle is kept.
fn write_bundle(
    export: &TabularExport<'_>,
    target: &Path,
    render: impl Fn(&Table) -> Result<Vec<u8>, ExportError>,
) -> Result<PathBuf, ExportError> {
    let mtime = u64::try_from(export.generated_at.timestamp()).unwrap_or(0);
    let file = AtomicFile::create(target)?;
    let mut archive = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    append(&mut archive, "README.txt", export.readme().as_bytes(), mtime)?;

    for (ty, table) in &export.tables {
        let csv = render(table).or_else(|error| {
            tracing::warn!(entity = %ty, %error, "table could not be rendered; writing error row");
            render_csv(&Table::error(&error.to_string()))
        })?;
        append(&mut archive, &format!("tables/{}.csv", ty.as_str()), &csv, mtime)?;
    }

    if let Some(report) = export.report {
        archive.append_path_with_name(report, "output.txt")?;
    }

    let file = archive.into_inner()?.finish()?;
    Ok(file.commit()?)
}

/// Render a table as CSV with a header row. Short rows are padded with
/// empty cells.
///
/// # Errors
///
/// Returns [`ExportError::Csv`] if the writer rejects a record.
pub fn render_csv(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in 0..table.rows.len() {
        writer.write_record(
            (0..table.columns.len()).map(|column| cell_text(table.cell(row, column)).into_owned()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

fn append<W: Write>(archive: &mut tar::Builder<W>, name: &str, data: &[u8], mtime: u64) -> std::io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(mtime);
    archive.append_data(&mut header, name, data)
}
