//! Per-column search text and visibility.

use serde::{Deserialize, Serialize};

use crate::columns::ColumnKey;

/// One column of the error table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub key: ColumnKey,
    /// Display only; never consulted when filtering
    pub visible: bool,
    pub label: String,
    pub search_text: String,
}

impl Column {
    fn new(key: ColumnKey) -> Self {
        Self {
            key,
            visible: key.default_visible(),
            label: key.label().to_string(),
            search_text: String::new(),
        }
    }

    pub fn is_filtering(&self) -> bool {
        !self.search_text.is_empty()
    }
}

/// All columns in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterModel {
    columns: Vec<Column>,
}

impl FilterModel {
    pub fn new() -> Self {
        Self {
            columns: ColumnKey::ALL.into_iter().map(Column::new).collect(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, key: ColumnKey) -> &Column {
        // ALL is the construction order, so the index is the discriminant
        &self.columns[key as usize]
    }

    fn column_mut(&mut self, key: ColumnKey) -> &mut Column {
        &mut self.columns[key as usize]
    }

    pub fn search_text(&self, key: ColumnKey) -> &str {
        &self.column(key).search_text
    }

    pub fn set_search_text(&mut self, key: ColumnKey, text: impl Into<String>) {
        self.column_mut(key).search_text = text.into();
    }

    /// Reset every search text. Visibility is untouched.
    pub fn clear(&mut self) {
        for column in &mut self.columns {
            column.search_text.clear();
        }
    }

    pub fn is_visible(&self, key: ColumnKey) -> bool {
        self.column(key).visible
    }

    pub fn set_visible(&mut self, key: ColumnKey, visible: bool) {
        self.column_mut(key).visible = visible;
    }

    pub fn toggle_visible(&mut self, key: ColumnKey) -> bool {
        let column = self.column_mut(key);
        column.visible = !column.visible;
        column.visible
    }

    /// Columns with non-empty search text, in declaration order
    pub fn active_terms(&self) -> impl Iterator<Item = (ColumnKey, &str)> {
        self.columns
            .iter()
            .filter(|c| c.is_filtering())
            .map(|c| (c.key, c.search_text.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.active_terms().next().is_none()
    }
}

impl Default for FilterModel {
    fn default() -> Self {
        Self::new()
    }
}
