//! Column registry for the error table.
//!
//! The key set is closed. `ColumnKey::ALL` is the declaration order and every
//! serialisation walks it, so emitted queries never depend on map ordering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TriageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKey {
    ErrLevel,
    ErrChild,
    Group,
    Repo,
    FileName,
    FileLink,
    FileDate,
    Target,
    SourceRef,
    SourceRegion,
    ShortMsg,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 11] = [
        ColumnKey::ErrLevel,
        ColumnKey::ErrChild,
        ColumnKey::Group,
        ColumnKey::Repo,
        ColumnKey::FileName,
        ColumnKey::FileLink,
        ColumnKey::FileDate,
        ColumnKey::Target,
        ColumnKey::SourceRef,
        ColumnKey::SourceRegion,
        ColumnKey::ShortMsg,
    ];

    /// Key as sent to and received from the server
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKey::ErrLevel => "errLevel",
            ColumnKey::ErrChild => "errChild",
            ColumnKey::Group => "group",
            ColumnKey::Repo => "repo",
            ColumnKey::FileName => "fileName",
            ColumnKey::FileLink => "fileLink",
            ColumnKey::FileDate => "fileDate",
            ColumnKey::Target => "target",
            ColumnKey::SourceRef => "sourceRef",
            ColumnKey::SourceRegion => "sourceRegion",
            ColumnKey::ShortMsg => "shortMsg",
        }
    }

    /// Human-readable column header
    pub fn label(&self) -> &'static str {
        match self {
            ColumnKey::ErrLevel => "level",
            ColumnKey::ErrChild => "error child",
            ColumnKey::Group => "group",
            ColumnKey::Repo => "repo",
            ColumnKey::FileName => "file name",
            ColumnKey::FileLink => "content",
            ColumnKey::FileDate => "modified",
            ColumnKey::Target => "target",
            ColumnKey::SourceRef => "source",
            ColumnKey::SourceRegion => "range",
            ColumnKey::ShortMsg => "short message",
        }
    }

    pub fn default_visible(&self) -> bool {
        matches!(
            self,
            ColumnKey::ErrLevel
                | ColumnKey::Group
                | ColumnKey::Repo
                | ColumnKey::FileName
                | ColumnKey::Target
                | ColumnKey::ShortMsg
        )
    }

    /// Columns that can serve as the active (grouping) field
    pub fn is_groupable(&self) -> bool {
        !matches!(
            self,
            ColumnKey::ErrChild | ColumnKey::FileLink | ColumnKey::SourceRef
        )
    }

    pub fn groupable() -> impl Iterator<Item = ColumnKey> {
        Self::ALL.into_iter().filter(|k| k.is_groupable())
    }

    /// Look up a key by wire name or label. `level` resolves to `errLevel`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s) || k.label() == s)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnKey {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| TriageError::UnknownColumn(s.to_string()))
    }
}
