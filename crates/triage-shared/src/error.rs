//! Error types for the triage dashboard.

use thiserror::Error;

pub type TriageResult<T> = Result<T, TriageError>;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("Build action failed: {0}")]
    Action(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column cannot be grouped: {0}")]
    NotGroupable(String),

    #[error("Invalid compare mode: {0} (expected newer or older)")]
    InvalidCompareMode(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
