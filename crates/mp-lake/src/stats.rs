//! Statistics sidecar reading.

use std::path::Path;

use mp_core::EntityType;
use mp_core::responses::TypeCounts;
use serde_json::Value;

use crate::LakeError;
use crate::locator::ChunkLocator;
use crate::reader::parse_relaxed;

/// Parse a sidecar: an object, or an array whose first element is the object.
///
/// # Errors
///
/// Returns [`LakeError`] if the file cannot be read or holds no object.
pub fn read_statistics(path: &Path) -> Result<TypeCounts, LakeError> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = parse_relaxed(text.trim())?;
    let object = match value {
        Value::Array(items) => items.into_iter().next(),
        other => Some(other),
    }
    .filter(Value::is_object)
    .ok_or_else(|| LakeError::NotAnObject {
        path: path.to_path_buf(),
    })?;

    Ok(TypeCounts {
        total_record_count: count_field(&object, "total_record_count"),
        chunk_count: count_field(&object, "chunk_count"),
    })
}

/// Counts for one type, or `None` when its sidecar is missing or unreadable.
#[must_use]
pub fn type_statistics(locator: &ChunkLocator, ty: EntityType) -> Option<TypeCounts> {
    let path = locator.statistics_file(ty)?;
    match read_statistics(&path) {
        Ok(counts) => Some(counts),
        Err(error) => {
            tracing::warn!(entity = %ty, path = %path.display(), %error, "ignoring unreadable statistics sidecar");
            None
        }
    }
}

/// Counts may arrive as integers or as floats from dataframe writers.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Checked non-negative and finite
fn count_field(object: &Value, field: &str) -> u64 {
    match object.get(field) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map_or(0, |f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn sidecar(content: &str) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("statistics.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_object_sidecar() {
        let (_dir, path) = sidecar(r#"{"total_record_count": 120, "chunk_count": 3, "partitions": [40, 40, 40]}"#);
        assert_eq!(
            read_statistics(&path).unwrap(),
            TypeCounts {
                total_record_count: 120,
                chunk_count: 3
            }
        );
    }

    #[test]
    fn reads_array_wrapped_sidecar_with_float_counts() {
        let (_dir, path) = sidecar(r#"[{"total_record_count": 12.0, "chunk_count": "2"}]"#);
        assert_eq!(
            read_statistics(&path).unwrap(),
            TypeCounts {
                total_record_count: 12,
                chunk_count: 2
            }
        );
    }

    #[test]
    fn rejects_non_object() {
        let (_dir, path) = sidecar("[]");
        assert!(read_statistics(&path).is_err());
    }

    #[test]
    fn missing_sidecar_is_none() {
        let dir = TempDir::new().unwrap();
        let locator = ChunkLocator::new(dir.path().to_path_buf(), None);
        assert!(type_statistics(&locator, EntityType::Table).is_none());
    }
}
