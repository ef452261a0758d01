//! In-memory tables for the tabular export.
//!
//! The tabular builder is the one place a whole type is held in memory: all
//! its records, concatenated, with the union of their columns.

use std::collections::HashMap;

use mp_core::EntityType;
use mp_lake::{ChunkCursor, ChunkLocator};
use serde_json::Value;

/// Column shown when a type has no records.
pub const PLACEHOLDER_COLUMN: &str = "info";
pub const PLACEHOLDER_VALUE: &str = "no records";
/// Column shown when a table could not be rendered.
pub const ERROR_COLUMN: &str = "error";

/// Rows under a shared header. Rows may be shorter than the header when a
/// column first appeared in a later chunk; missing trailing cells are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// The one-row table written for a type without records.
    #[must_use]
    pub fn placeholder() -> Self {
        Self::single(PLACEHOLDER_COLUMN, PLACEHOLDER_VALUE)
    }

    /// The one-row table written in place of a table that failed to render.
    #[must_use]
    pub fn error(message: &str) -> Self {
        Self::single(ERROR_COLUMN, message)
    }

    fn single(column: &str, value: &str) -> Self {
        Self {
            columns: vec![column.to_string()],
            rows: vec![vec![Value::String(value.to_string())]],
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// This table, or the placeholder if it has no rows.
    #[must_use]
    pub fn or_placeholder(self) -> Self {
        if self.is_empty() { Self::placeholder() } else { self }
    }

    /// Cell at `row`, `column`; `None` past the end of a short row.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)
    }
}

/// Concatenate every chunk of `ty`, with the union of columns in first-seen
/// order.
#[must_use]
pub fn build_table(locator: &ChunkLocator, ty: EntityType) -> Table {
    let mut table = Table::default();
    let mut index: HashMap<String, usize> = HashMap::new();

    for chunk in ChunkCursor::new(locator, ty) {
        for record in chunk.records {
            let mut row = vec![Value::Null; table.columns.len()];
            for (column, value) in record {
                let position = *index.entry(column).or_insert_with_key(|name| {
                    table.columns.push(name.clone());
                    table.columns.len() - 1
                });
                if position >= row.len() {
                    row.resize(position + 1, Value::Null);
                }
                row[position] = value;
            }
            table.rows.push(row);
        }
    }

    tracing::debug!(entity = %ty, rows = table.rows.len(), columns = table.columns.len(), "table built");
    table
}
