//! Workbook strategy (`output.xlsx`).
//!
//! One sheet per type, a `report` sheet with the text report's lines and an
//! `about` sheet. The workbook is rendered in memory and then written
//! atomically, so a failed render never touches the target.

use std::path::{Path, PathBuf};

use mp_core::enums::TabularStrategy;

use super::{TabularExport, TabularSink};
use crate::ExportError;

#[derive(Debug, Default, Clone, Copy)]
pub struct WorkbookSink;

impl TabularSink for WorkbookSink {
    fn strategy(&self) -> TabularStrategy {
        TabularStrategy::Workbook
    }

    #[cfg(feature = "xlsx")]
    fn write(&self, export: &TabularExport<'_>, target: &Path) -> Result<PathBuf, ExportError> {
        let report = match export.report {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => None,
        };
        let bytes = engine::render(export, report.as_deref())
            .map_err(|e| ExportError::Workbook(e.to_string()))?;
        Ok(mp_lake::write_atomic(target, &bytes)?)
    }

    #[cfg(not(feature = "xlsx"))]
    fn write(&self, _export: &TabularExport<'_>, _target: &Path) -> Result<PathBuf, ExportError> {
        Err(ExportError::EngineUnavailable("xlsx"))
    }
}

#[cfg(feature = "xlsx")]
mod engine {
    use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};
    use serde_json::{Number, Value};

    use super::TabularExport;
    use crate::cell::cell_text;
    use crate::table::Table;

    const MAX_SHEET_NAME: usize = 31;
    const MAX_CELL_CHARS: usize = 32_767;
    /// Largest integer magnitude an f64 cell holds exactly.
    const MAX_EXACT_INT: u64 = 1 << 53;

    pub(super) fn render(export: &TabularExport<'_>, report: Option<&str>) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        for (ty, table) in &export.tables {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name(ty.as_str()))?;
            write_table(sheet, table, &bold)?;
        }

        if let Some(report) = report {
            let sheet = workbook.add_worksheet();
            sheet.set_name("report")?;
            for (i, line) in report.lines().enumerate() {
                sheet.write_string(row_num(i)?, 0, clip(line))?;
            }
        }

        let about = workbook.add_worksheet();
        about.set_name("about")?;
        for (i, (key, value)) in export.about().into_iter().enumerate() {
            let row = row_num(i)?;
            about.write_string_with_format(row, 0, key, &bold)?;
            about.write_string(row, 1, value)?;
        }

        workbook.save_to_buffer()
    }

    fn write_table(sheet: &mut Worksheet, table: &Table, bold: &Format) -> Result<(), XlsxError> {
        for (c, column) in table.columns.iter().enumerate() {
            sheet.write_string_with_format(0, col_num(c)?, clip(column), bold)?;
        }
        for r in 0..table.rows.len() {
            let row = row_num(r + 1)?;
            for c in 0..table.columns.len() {
                write_cell(sheet, row, col_num(c)?, table.cell(r, c))?;
            }
        }
        Ok(())
    }

    fn write_cell(sheet: &mut Worksheet, row: RowNum, col: ColNum, value: Option<&Value>) -> Result<(), XlsxError> {
        match value {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => {
                sheet.write_boolean(row, col, *b)?;
            }
            Some(Value::Number(n)) => match exact_f64(n) {
                Some(number) => {
                    sheet.write_number(row, col, number)?;
                }
                None => {
                    sheet.write_string(row, col, n.to_string())?;
                }
            },
            Some(other) => {
                sheet.write_string(row, col, clip(&cell_text(Some(other))))?;
            }
        }
        Ok(())
    }

    /// Integers beyond f64 precision are written as text instead of rounded.
    fn exact_f64(n: &Number) -> Option<f64> {
        if n.is_f64() {
            return n.as_f64();
        }
        let magnitude = n.as_i64().map(i64::unsigned_abs).or_else(|| n.as_u64())?;
        if magnitude <= MAX_EXACT_INT { n.as_f64() } else { None }
    }

    fn sheet_name(name: &str) -> &str {
        truncate_chars(name, MAX_SHEET_NAME)
    }

    fn clip(text: &str) -> &str {
        truncate_chars(text, MAX_CELL_CHARS)
    }

    fn truncate_chars(text: &str, max: usize) -> &str {
        text.char_indices().nth(max).map_or(text, |(i, _)| &text[..i])
    }

    fn row_num(i: usize) -> Result<RowNum, XlsxError> {
        RowNum::try_from(i).map_err(|_| XlsxError::RowColumnLimitError)
    }

    fn col_num(i: usize) -> Result<ColNum, XlsxError> {
        ColNum::try_from(i).map_err(|_| XlsxError::RowColumnLimitError)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn truncates_on_char_boundary() {
            assert_eq!(truncate_chars("quality_metric", 31), "quality_metric");
            assert_eq!(truncate_chars("ééé", 2), "éé");
        }

        #[test]
        fn large_integers_are_not_rounded() {
            assert_eq!(exact_f64(&Number::from(42)), Some(42.0));
            assert_eq!(exact_f64(&Number::from(u64::MAX)), None);
            assert_eq!(exact_f64(&Number::from(i64::MIN)), None);
            assert_eq!(exact_f64(&Number::from_f64(0.25).unwrap()), Some(0.25));
        }
    }
}

#[cfg(all(test, feature = "xlsx"))]
mod tests {
    use mp_lake::ChunkLocator;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn writes_zip_container() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("output.txt");
        std::fs::write(&report, "=== TABLE ===\nid\n1\n").unwrap();

        let locator = ChunkLocator::new(dir.path().join("none"), None);
        let export = TabularExport::collect(&locator, "r1", "exports/r1", Some(&report));
        let target = dir.path().join("output.xlsx");

        let path = WorkbookSink.write(&export, &target).unwrap();
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
