//! Stack of hidden result clusters.
//!
//! Each snapshot is a row captured at "hide" time. Its position in the stack
//! becomes the numeric suffix of its query parameters, so the stack is only
//! ever pushed, popped or cleared.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::columns::ColumnKey;
use crate::error::{TriageError, TriageResult};
use crate::row::value_text;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionSnapshot {
    values: BTreeMap<ColumnKey, String>,
}

impl ExclusionSnapshot {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (ColumnKey, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k, v.to_string()))
                .collect(),
        }
    }

    /// Build a snapshot from the hide response.
    ///
    /// Accepts an object, or an array whose first element is the object.
    /// Unknown keys and null values are dropped.
    pub fn from_json(payload: &Value) -> TriageResult<Self> {
        let object = match payload {
            Value::Object(map) => map,
            Value::Array(items) => match items.first() {
                Some(Value::Object(map)) => map,
                Some(_) => {
                    return Err(TriageError::Decode(
                        "hide response element is not an object".to_string(),
                    ))
                }
                None => {
                    return Err(TriageError::Decode("hide response is empty".to_string()))
                }
            },
            _ => {
                return Err(TriageError::Decode(
                    "hide response is not an object".to_string(),
                ))
            }
        };

        let values = object
            .iter()
            .filter_map(|(k, v)| {
                let key = ColumnKey::ALL.into_iter().find(|c| c.as_str() == k)?;
                value_text(v).map(|text| (key, text))
            })
            .collect();

        Ok(Self { values })
    }

    pub fn get(&self, key: ColumnKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Non-empty values in column declaration order
    pub fn terms(&self) -> impl Iterator<Item = (ColumnKey, &str)> {
        self.values
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (*k, v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.terms().next().is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionStack {
    snapshots: Vec<ExclusionSnapshot>,
}

impl ExclusionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, snapshot: ExclusionSnapshot) {
        self.snapshots.push(snapshot);
    }

    /// Remove the most recent snapshot
    pub fn pop(&mut self) -> Option<ExclusionSnapshot> {
        self.snapshots.pop()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshots bottom to top, paired with their stack position
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ExclusionSnapshot)> {
        self.snapshots.iter().enumerate()
    }
}
