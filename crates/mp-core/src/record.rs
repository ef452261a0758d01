//! The schemaless record shape.
//!
//! Chunk schemas vary per entity type and are inferred per chunk, so a record
//! is a column-ordered JSON object rather than a typed struct. Column order is
//! the order of the source (`serde_json` is built with `preserve_order`).

use serde_json::{Map, Value};

/// One row of extracted metadata: column name to scalar.
pub type Record = Map<String, Value>;

/// Column names of a record, in source order.
#[must_use]
pub fn columns(record: &Record) -> Vec<String> {
    record.keys().cloned().collect()
}

/// Replace a float that JSON cannot represent with `null`.
///
/// `serde_json::Number` never holds NaN or infinity, so this is the single
/// place where decoded floats enter a record.
#[must_use]
pub fn finite_or_null(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}
