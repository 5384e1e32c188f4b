//! Rows returned by the error endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::columns::ColumnKey;
use crate::error::{TriageError, TriageResult};

/// Render a scalar JSON value as display text. Null, arrays and objects have none.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// One error entry, keyed by wire column name. Extra keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow(BTreeMap<String, Value>);

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (ColumnKey, &'a str)>) -> Self {
        let mut row = Self::new();
        for (key, value) in pairs {
            row.set(key, value);
        }
        row
    }

    pub fn set(&mut self, key: ColumnKey, value: impl Into<String>) {
        self.0
            .insert(key.as_str().to_string(), Value::String(value.into()));
    }

    pub fn raw(&self, key: ColumnKey) -> Option<&Value> {
        self.0.get(key.as_str())
    }

    pub fn text(&self, key: ColumnKey) -> Option<String> {
        self.raw(key).and_then(value_text)
    }

    pub fn text_or_empty(&self, key: ColumnKey) -> String {
        self.text(key).unwrap_or_default()
    }

    pub fn group(&self) -> String {
        self.text_or_empty(ColumnKey::Group)
    }

    pub fn repo(&self) -> String {
        self.text_or_empty(ColumnKey::Repo)
    }

    pub fn target(&self) -> String {
        self.text_or_empty(ColumnKey::Target)
    }

    pub fn file_name(&self) -> String {
        self.text_or_empty(ColumnKey::FileName)
    }
}

/// Aggregate row from the group endpoint. Only displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupRow(pub Value);

impl GroupRow {
    /// Scalar fields sorted by key, for display
    pub fn fields(&self) -> Vec<(String, String)> {
        match &self.0 {
            Value::Object(map) => map
                .iter()
                .filter_map(|(k, v)| value_text(v).map(|t| (k.clone(), t)))
                .collect(),
            other => value_text(other)
                .map(|t| vec![(String::new(), t)])
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub count: u64,
}

/// Decode the `[{"count": n}]` payload of the count endpoint
pub fn parse_count(payload: Value) -> TriageResult<u64> {
    let rows: Vec<CountRow> = serde_json::from_value(payload)
        .map_err(|e| TriageError::Decode(format!("count response: {}", e)))?;
    rows.first()
        .map(|r| r.count)
        .ok_or_else(|| TriageError::Decode("count response is empty".to_string()))
}

/// Display ordering of the row table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: ColumnKey,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: ColumnKey::FileDate,
            ascending: true,
        }
    }
}

impl SortSpec {
    fn compare(&self, a: &ResultRow, b: &ResultRow) -> Ordering {
        let ord = a.text(self.column).cmp(&b.text(self.column));
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }
}

/// Stable sort for display; rows without a value come first when ascending
pub fn sort_rows(rows: &mut [ResultRow], spec: SortSpec) {
    rows.sort_by(|a, b| spec.compare(a, b));
}
