//! Comparison semantics for the `fileDate` column.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TriageError;

/// Mode value that suppresses the `compare` query parameter.
/// No `CompareMode` ever renders as this string.
pub const CONTAINS_SENTINEL: &str = "contains";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Row date on or after the search text
    #[default]
    Newer,
    /// Row date strictly before the search text
    Older,
}

impl CompareMode {
    pub const ALL: [CompareMode; 2] = [CompareMode::Newer, CompareMode::Older];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareMode::Newer => "newer",
            CompareMode::Older => "older",
        }
    }

    pub fn emits_parameter(&self) -> bool {
        self.as_str() != CONTAINS_SENTINEL
    }

    /// Ordering test of a row value against the search text
    pub fn accepts(&self, value: &str, search: &str) -> bool {
        match self {
            CompareMode::Newer => value >= search,
            CompareMode::Older => value < search,
        }
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompareMode {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newer" => Ok(CompareMode::Newer),
            "older" => Ok(CompareMode::Older),
            _ => Err(TriageError::InvalidCompareMode(s.to_string())),
        }
    }
}
