//! Local evaluation of the filter predicate.
//!
//! Used to pick rows for bulk build actions without asking the server again,
//! so it must agree with the server's filter for the same model.

use crate::columns::ColumnKey;
use crate::compare::CompareMode;
use crate::filter::FilterModel;
use crate::row::ResultRow;

pub fn matches(row: &ResultRow, filter: &FilterModel, compare: CompareMode) -> bool {
    filter
        .active_terms()
        .all(|(key, search)| column_matches(row, key, search, compare))
}

fn column_matches(row: &ResultRow, key: ColumnKey, search: &str, compare: CompareMode) -> bool {
    let Some(value) = row.text(key) else {
        return false;
    };
    if key == ColumnKey::FileDate {
        compare.accepts(&value, search)
    } else {
        value.contains(search)
    }
}

/// Rows of `rows` accepted by the live filter, in their original order
pub fn select<'a>(
    rows: &'a [ResultRow],
    filter: &'a FilterModel,
    compare: CompareMode,
) -> impl Iterator<Item = &'a ResultRow> + 'a {
    rows.iter().filter(move |row| matches(row, filter, compare))
}
