//! Record readers for the accepted chunk formats.
//!
//! Every format sits behind [`RecordReader`]: `open(path)` yields a lazy,
//! finite, non-restartable stream of records. [`load_chunk`] is what the
//! consolidators call: it drains one chunk all-or-nothing and reports
//! `Records` / `Empty` / `Corrupt` so the caller can decide to skip.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use duckdb::Connection;
use duckdb::types::{TimeUnit, Value as DuckValue};
use mp_core::Record;
use mp_core::record::finite_or_null;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tempfile::NamedTempFile;

use crate::LakeError;

/// A lazy sequence of decoded records from one chunk.
pub type RecordStream = Box<dyn Iterator<Item = Result<Record, LakeError>>>;

/// Capability shared by every chunk format.
pub trait RecordReader: Send + Sync {
    /// Open `path` and return its records.
    ///
    /// # Errors
    ///
    /// Returns [`LakeError`] if the file cannot be opened or its framing is
    /// unreadable. Per-record decode errors surface as stream items.
    fn open(&self, path: &Path) -> Result<RecordStream, LakeError>;
}

/// The closed set of accepted record-file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFormat {
    /// `.json`: an array of objects, one object, or newline-delimited objects.
    Json,
    /// `.jsonl`: one object per line.
    JsonLines,
    /// `.parquet`: decoded through `DuckDB`.
    Parquet,
}

impl ChunkFormat {
    /// Select the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "jsonl" => Some(Self::JsonLines),
            "parquet" => Some(Self::Parquet),
            _ => None,
        }
    }

    #[must_use]
    pub fn reader(self) -> &'static dyn RecordReader {
        match self {
            Self::Json => &JsonReader,
            Self::JsonLines => &JsonLinesReader,
            Self::Parquet => &ParquetReader,
        }
    }
}

/// Open a chunk with the reader its extension selects.
///
/// # Errors
///
/// Returns [`LakeError::UnsupportedFormat`] for unknown extensions, or the
/// reader's own error.
pub fn open_records(path: &Path) -> Result<RecordStream, LakeError> {
    let format =
        ChunkFormat::from_path(path).ok_or_else(|| LakeError::UnsupportedFormat(path.into()))?;
    format.reader().open(path)
}

/// Result of draining one chunk.
#[derive(Debug)]
pub enum ChunkLoad {
    Records(Vec<Record>),
    Empty,
    Corrupt(LakeError),
}

/// Read a whole chunk. A decode error anywhere marks the chunk corrupt, so
/// a half-read file never contributes records.
#[must_use]
pub fn load_chunk(path: &Path) -> ChunkLoad {
    let stream = match open_records(path) {
        Ok(stream) => stream,
        Err(error) => return ChunkLoad::Corrupt(error),
    };

    match stream.collect::<Result<Vec<_>, _>>() {
        Ok(records) if records.is_empty() => ChunkLoad::Empty,
        Ok(records) => ChunkLoad::Records(records),
        Err(error) => ChunkLoad::Corrupt(error),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

pub struct JsonReader;

impl RecordReader for JsonReader {
    fn open(&self, path: &Path) -> Result<RecordStream, LakeError> {
        let text = std::fs::read_to_string(path)?;
        let trimmed = text.trim_start();

        if trimmed.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }

        if trimmed.starts_with('[') {
            let values: Vec<Value> = parse_relaxed(trimmed)?;
            let path = path.to_path_buf();
            return Ok(Box::new(
                values.into_iter().map(move |v| into_record(v, &path)),
            ));
        }

        // A single object, or an upstream writer that emitted JSON Lines
        // under a `.json` name.
        if let Ok(value) = parse_relaxed::<Value>(trimmed) {
            return Ok(Box::new(std::iter::once(into_record(value, path))));
        }

        let lines: Vec<String> = text.lines().map(str::to_owned).collect();
        let path = path.to_path_buf();
        Ok(Box::new(
            lines
                .into_iter()
                .filter(|line| !line.trim().is_empty())
                .map(move |line| parse_line(&line, &path)),
        ))
    }
}

// ---------------------------------------------------------------------------
// JSON Lines
// ---------------------------------------------------------------------------

pub struct JsonLinesReader;

impl RecordReader for JsonLinesReader {
    fn open(&self, path: &Path) -> Result<RecordStream, LakeError> {
        let reader = BufReader::new(File::open(path)?);
        let path = path.to_path_buf();
        Ok(Box::new(reader.lines().filter_map(move |line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(parse_line(&line, &path)),
            Err(error) => Some(Err(LakeError::Io(error))),
        })))
    }
}

fn parse_line(line: &str, path: &Path) -> Result<Record, LakeError> {
    let value: Value = parse_relaxed(line)?;
    into_record(value, path)
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

pub struct ParquetReader;

impl RecordReader for ParquetReader {
    fn open(&self, path: &Path) -> Result<RecordStream, LakeError> {
        let records = read_parquet(path)?;
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}

fn read_parquet(path: &Path) -> Result<Vec<Record>, LakeError> {
    let staged = if has_glob_chars(path) {
        Some(stage_copy(path)?)
    } else {
        None
    };
    let path = staged.as_ref().map_or(path, NamedTempFile::path);

    let conn = Connection::open_in_memory()?;
    let source = format!(
        "read_parquet('{}')",
        path.to_string_lossy().replace('\'', "''")
    );

    let columns: Vec<String> = {
        let mut stmt = conn.prepare(&format!("DESCRIBE SELECT * FROM {source}"))?;
        stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?
    };

    let mut stmt = conn.prepare(&format!("SELECT * FROM {source}"))?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Record::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            let value: DuckValue = row.get(idx)?;
            record.insert(name.clone(), duck_to_json(value));
        }
        out.push(record);
    }
    Ok(out)
}

/// `read_parquet` expands `*`, `?` and `[...]` in its argument.
fn has_glob_chars(path: &Path) -> bool {
    path.to_string_lossy().contains(['*', '?', '[', ']'])
}

/// Copy a chunk whose name `DuckDB` would glob to a plain-named temp file.
fn stage_copy(path: &Path) -> Result<NamedTempFile, LakeError> {
    let staged = tempfile::Builder::new()
        .prefix("chunk-")
        .suffix(".parquet")
        .tempfile()?;
    std::fs::copy(path, staged.path())?;
    tracing::debug!(path = %path.display(), staged = %staged.path().display(), "staged glob-named parquet chunk");
    Ok(staged)
}

/// Convert a `DuckDB` cell to a JSON scalar. Types without a natural JSON
/// form fall back to their string representation instead of failing the row.
fn duck_to_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(v) => Value::from(v),
        DuckValue::SmallInt(v) => Value::from(v),
        DuckValue::Int(v) => Value::from(v),
        DuckValue::BigInt(v) => Value::from(v),
        DuckValue::UTinyInt(v) => Value::from(v),
        DuckValue::USmallInt(v) => Value::from(v),
        DuckValue::UInt(v) => Value::from(v),
        DuckValue::UBigInt(v) => Value::from(v),
        DuckValue::HugeInt(v) => {
            i64::try_from(v).map_or_else(|_| Value::String(v.to_string()), Value::from)
        }
        DuckValue::Float(v) => finite_or_null(f64::from(v)),
        DuckValue::Double(v) => finite_or_null(v),
        DuckValue::Decimal(d) => Value::String(d.to_string()),
        DuckValue::Text(s) => Value::String(s),
        DuckValue::Timestamp(unit, v) => timestamp_to_json(unit, v),
        DuckValue::Date32(days) => date_to_json(days),
        DuckValue::List(items) => Value::Array(items.into_iter().map(duck_to_json).collect()),
        other => Value::String(format!("{other:?}")),
    }
}

fn timestamp_to_json(unit: TimeUnit, value: i64) -> Value {
    let micros = match unit {
        TimeUnit::Second => value.checked_mul(1_000_000),
        TimeUnit::Millisecond => value.checked_mul(1_000),
        TimeUnit::Microsecond => Some(value),
        TimeUnit::Nanosecond => Some(value / 1_000),
    };
    micros
        .and_then(chrono::DateTime::from_timestamp_micros)
        .map_or(Value::Null, |dt| {
            Value::String(dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        })
}

/// Days since 1970-01-01 is day 719163 counted from 0001-01-01.
fn date_to_json(days: i32) -> Value {
    days.checked_add(719_163)
        .and_then(chrono::NaiveDate::from_num_days_from_ce_opt)
        .map_or(Value::Null, |date| Value::String(date.to_string()))
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn into_record(value: Value, path: &Path) -> Result<Record, LakeError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(LakeError::NotAnObject {
            path: PathBuf::from(path),
        }),
    }
}

/// Parse JSON, retrying once with non-finite literals (`NaN`, `Infinity`,
/// `-Infinity`) replaced by `null` when the strict parse fails.
///
/// # Errors
///
/// Returns the strict parser's error if relaxing does not help.
pub fn parse_relaxed<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict) => match relax_non_finite(text) {
            Some(relaxed) => serde_json::from_str(&relaxed).map_err(|_| strict),
            None => Err(strict),
        },
    }
}

/// Replace bare non-finite literals outside string values with `null`.
/// Returns `None` when the text contains none.
#[must_use]
pub fn relax_non_finite(text: &str) -> Option<String> {
    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut replaced = false;
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if let Some(token) = TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            replaced = true;
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    replaced.then_some(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn records(path: &Path) -> Vec<Record> {
        match load_chunk(path) {
            ChunkLoad::Records(records) => records,
            other => panic!("expected records, got {other:?}"),
        }
    }

    #[rstest]
    #[case("chunk-0.json", Some(ChunkFormat::Json))]
    #[case("chunk-0.jsonl", Some(ChunkFormat::JsonLines))]
    #[case("chunk-0.parquet", Some(ChunkFormat::Parquet))]
    #[case("chunk-0.csv", None)]
    #[case("chunk-0", None)]
    fn format_from_extension(#[case] name: &str, #[case] expected: Option<ChunkFormat>) {
        assert_eq!(ChunkFormat::from_path(Path::new(name)), expected);
    }

    #[test]
    fn json_array_chunk() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.json", r#"[{"id":1,"name":"a"},{"id":2,"name":"b"}]"#);
        let rows = records(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(Value::Object(rows[1].clone()), json!({"id": 2, "name": "b"}));
    }

    #[test]
    fn json_single_object_chunk() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.json", r#"{"id":7}"#);
        assert_eq!(records(&path).len(), 1);
    }

    #[test]
    fn json_file_holding_lines() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.json", "{\"id\":1}\n\n{\"id\":2}\n");
        assert_eq!(records(&path).len(), 2);
    }

    #[test]
    fn jsonl_chunk_keeps_column_order() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.jsonl", "{\"z\":1,\"a\":2}\n{\"z\":3,\"a\":4}\n");
        let rows = records(&path);
        assert_eq!(mp_core::record::columns(&rows[0]), vec!["z", "a"]);
    }

    #[test]
    fn non_finite_literals_read_as_null() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "chunk-0.jsonl",
            "{\"ratio\":NaN,\"max\":Infinity,\"min\":-Infinity,\"note\":\"NaN stays\"}\n",
        );
        let rows = records(&path);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({"ratio": null, "max": null, "min": null, "note": "NaN stays"})
        );
    }

    #[test]
    fn empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.json", "   \n");
        assert!(matches!(load_chunk(&path), ChunkLoad::Empty));
        let path = write(&dir, "chunk-1.json", "[]");
        assert!(matches!(load_chunk(&path), ChunkLoad::Empty));
    }

    #[test]
    fn bad_line_marks_whole_chunk_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.jsonl", "{\"id\":1}\n{not json\n{\"id\":3}\n");
        assert!(matches!(load_chunk(&path), ChunkLoad::Corrupt(_)));
    }

    #[test]
    fn scalar_elements_are_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.json", "[1, 2, 3]");
        assert!(matches!(
            load_chunk(&path),
            ChunkLoad::Corrupt(LakeError::NotAnObject { .. })
        ));
    }

    #[test]
    fn missing_file_is_corrupt_not_panic() {
        assert!(matches!(
            load_chunk(Path::new("/nonexistent/chunk-0.json")),
            ChunkLoad::Corrupt(LakeError::Io(_))
        ));
    }

    #[test]
    fn jsonl_stream_is_lazy() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.jsonl", "{\"id\":1}\n{broken\n");
        let mut stream = open_records(&path).unwrap();
        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }

    #[test]
    fn parquet_chunk_decodes_through_duckdb() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunk-0.parquet");
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "COPY (SELECT * FROM (VALUES (1, 'a', 1.5::DOUBLE, DATE '2024-03-01'), \
             (2, NULL, 'NaN'::DOUBLE, DATE '1970-01-02')) t(id, name, score, created)) \
             TO '{}' (FORMAT PARQUET)",
            path.display()
        ))
        .unwrap();

        let rows = records(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({"id": 1, "name": "a", "score": 1.5, "created": "2024-03-01"})
        );
        assert_eq!(
            Value::Object(rows[1].clone()),
            json!({"id": 2, "name": null, "score": null, "created": "1970-01-02"})
        );
    }

    #[rstest]
    #[case("chunk-[0].parquet")]
    #[case("chunk-*.parquet")]
    #[case("chunk-?.parquet")]
    fn glob_characters_in_chunk_name_are_literal(#[case] name: &str) {
        let dir = TempDir::new().unwrap();
        let plain = dir.path().join("plain.parquet");
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "COPY (SELECT 7 AS id) TO '{}' (FORMAT PARQUET)",
            plain.display()
        ))
        .unwrap();
        let path = dir.path().join(name);
        std::fs::rename(&plain, &path).unwrap();

        let rows = records(&path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(7));
    }

    #[test]
    fn garbage_parquet_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chunk-0.parquet", "definitely not parquet");
        assert!(matches!(load_chunk(&path), ChunkLoad::Corrupt(_)));
    }

    #[test]
    fn relax_leaves_strings_untouched() {
        assert_eq!(relax_non_finite(r#"{"a":"NaN"}"#), None);
        assert_eq!(
            relax_non_finite(r#"{"a":"x\"NaN","b":NaN}"#).as_deref(),
            Some(r#"{"a":"x\"NaN","b":null}"#)
        );
    }
}
