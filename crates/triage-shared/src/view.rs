//! Session view state: everything the user can change between searches.

use serde::Serialize;

use crate::build::BuildLevel;
use crate::columns::ColumnKey;
use crate::compare::CompareMode;
use crate::config::ViewConfig;
use crate::exclusion::ExclusionStack;
use crate::filter::FilterModel;
use crate::matcher;
use crate::query;
use crate::row::{ResultRow, SortSpec};

#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub filter: FilterModel,
    pub exclusions: ExclusionStack,
    pub compare: CompareMode,
    /// Column used for grouping and hiding
    pub active_field: ColumnKey,
    pub build_level: BuildLevel,
    pub sort: SortSpec,
    pub show_build_result: bool,
}

impl ViewState {
    pub fn from_config(config: &ViewConfig) -> Self {
        Self {
            filter: FilterModel::new(),
            exclusions: ExclusionStack::new(),
            compare: config.compare,
            active_field: config.effective_active_field(),
            build_level: config.build_level.clone(),
            sort: SortSpec::default(),
            show_build_result: config.show_build_result,
        }
    }

    pub fn query(&self, limit: usize, include_active_field: bool) -> String {
        query::encode(
            &self.filter,
            &self.exclusions,
            self.compare,
            self.active_field,
            limit,
            include_active_field,
        )
    }

    pub fn matches(&self, row: &ResultRow) -> bool {
        matcher::matches(row, &self.filter, self.compare)
    }

    /// Loaded rows passing the live filter, in display order
    pub fn visible_rows(&self, rows: &[ResultRow]) -> Vec<ResultRow> {
        let mut visible: Vec<ResultRow> = matcher::select(rows, &self.filter, self.compare)
            .cloned()
            .collect();
        crate::row::sort_rows(&mut visible, self.sort);
        visible
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::from_config(&ViewConfig::default())
    }
}
