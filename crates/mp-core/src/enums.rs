//! Entity types extracted from the source database.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! The declaration order of [`EntityType`] is the section order of every
//! consolidated artifact.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// A category of extracted metadata. Each type owns one raw and one
/// transformed partition folder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Database,
    Schema,
    Table,
    Column,
    Index,
    QualityMetric,
    Relationship,
    ViewDependency,
}

impl EntityType {
    /// Every entity type, in artifact section order.
    pub const ALL: [Self; 8] = [
        Self::Database,
        Self::Schema,
        Self::Table,
        Self::Column,
        Self::Index,
        Self::QualityMetric,
        Self::Relationship,
        Self::ViewDependency,
    ];

    /// Folder segment and document key for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Schema => "schema",
            Self::Table => "table",
            Self::Column => "column",
            Self::Index => "index",
            Self::QualityMetric => "quality_metric",
            Self::Relationship => "relationship",
            Self::ViewDependency => "view_dependency",
        }
    }

    /// Section title used in the text report (`=== TABLE ===`).
    #[must_use]
    pub fn section_title(self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown entity type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Which upstream stage produced a partition folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Raw,
    Transformed,
}

impl Partition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Transformed => "transformed",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TabularStrategy
// ---------------------------------------------------------------------------

/// Which tabular export strategy produced the spreadsheet artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TabularStrategy {
    Workbook,
    Bundle,
}

impl TabularStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workbook => "workbook",
            Self::Bundle => "bundle",
        }
    }

    /// Artifact file name for this strategy.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Workbook => "output.xlsx",
            Self::Bundle => "output.tar.gz",
        }
    }
}

impl fmt::Display for TabularStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
