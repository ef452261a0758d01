//! Target notations and detail levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DiagramError;

/// Diagram dialect the sanitizer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notation {
    /// Directed flow graph: `flowchart TD` with `A --> B` edges.
    Flowchart,
    /// Entity-relationship: `erDiagram` with `A ||--o{ B : "label"` edges.
    Er,
}

impl Notation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flowchart => "flowchart",
            Self::Er => "er",
        }
    }

    /// Maximum number of relations kept.
    #[must_use]
    pub const fn max_edges(self) -> usize {
        match self {
            Self::Flowchart => 20,
            Self::Er => 8,
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Notation {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flowchart" | "flow" | "graph" => Ok(Self::Flowchart),
            "er" | "erd" | "er_diagram" | "erdiagram" => Ok(Self::Er),
            _ => Err(DiagramError::InvalidValue {
                kind: "notation",
                value: s.to_string(),
            }),
        }
    }
}

/// How much of the schema the model is asked to cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    #[default]
    Basic,
    Detailed,
}

impl DetailLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Detailed => "detailed",
        }
    }
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetailLevel {
    type Err = DiagramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "detailed" | "full" => Ok(Self::Detailed),
            _ => Err(DiagramError::InvalidValue {
                kind: "detail level",
                value: s.to_string(),
            }),
        }
    }
}
