//! Build and clean commands derived from result rows.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::query::escape_component;
use crate::row::ResultRow;

/// Payload the executor returns when a build printed nothing
pub const NO_OUTPUT_SENTINEL: &str = "<div></div>";

/// Profile suffix appended to a build target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildLevel(String);

impl BuildLevel {
    pub fn new(level: impl Into<String>) -> Self {
        Self(level.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BuildLevel {
    fn default() -> Self {
        Self("0".to_string())
    }
}

impl fmt::Display for BuildLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One invocation of the build executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCommand {
    /// `<group>/<repo>`
    pub path_key: String,
    pub target: String,
    /// Already escaped as a URI component
    pub file_name: String,
    pub clean: bool,
}

impl BuildCommand {
    /// Clean runs `-<target>`, a build runs `<target><level>`
    pub fn for_row(row: &ResultRow, clean: bool, level: &BuildLevel) -> Self {
        let target = if clean {
            format!("-{}", row.target())
        } else {
            format!("{}{}", row.target(), level)
        };
        Self {
            path_key: format!("{}/{}", row.group(), row.repo()),
            target,
            file_name: escape_component(&row.file_name()),
            clean,
        }
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build {} {}", self.path_key, self.target)?;
        if !self.file_name.is_empty() {
            write!(f, " {}", self.file_name)?;
        }
        Ok(())
    }
}

/// Whether the executor reply should replace the displayed output
pub fn is_no_output(payload: &str) -> bool {
    payload == NO_OUTPUT_SENTINEL
}
