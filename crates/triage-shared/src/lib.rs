//! Shared types for the error triage dashboard.
//!
//! Everything here is synchronous: the column registry, filter state,
//! exclusion stack, query encoding, the local row predicate and
//! configuration. The async client lives in `triagectl`.

pub mod build;
pub mod columns;
pub mod compare;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod exclusion;
pub mod filter;
pub mod matcher;
pub mod query;
pub mod row;
pub mod view;

pub use build::{BuildCommand, BuildLevel, NO_OUTPUT_SENTINEL};
pub use columns::ColumnKey;
pub use compare::CompareMode;
pub use config::TriageConfig;
pub use error::{TriageError, TriageResult};
pub use exclusion::{ExclusionSnapshot, ExclusionStack};
pub use filter::{Column, FilterModel};
pub use row::{GroupRow, ResultRow, SortSpec};
pub use view::ViewState;
