//! Tests for local row matching.

use triage_shared::matcher::{matches, select};
use triage_shared::{ColumnKey, CompareMode, FilterModel, ResultRow};

fn dated(date: &str) -> ResultRow {
    ResultRow::from_pairs([(ColumnKey::FileDate, date), (ColumnKey::ShortMsg, "unbound")])
}

#[test]
fn test_file_date_newer_includes_equal() {
    let mut filter = FilterModel::new();
    filter.set_search_text(ColumnKey::FileDate, "2023-01-01");
    let row = dated("2023-01-01");
    assert!(matches(&row, &filter, CompareMode::Newer));
    assert!(!matches(&row, &filter, CompareMode::Older));
}

#[test]
fn test_file_date_older_is_strict() {
    let mut filter = FilterModel::new();
    filter.set_search_text(ColumnKey::FileDate, "2023-01-01");
    assert!(matches(&dated("2022-12-31"), &filter, CompareMode::Older));
    assert!(!matches(&dated("2022-12-31"), &filter, CompareMode::Newer));
}

#[test]
fn test_empty_search_is_vacuous() {
    let filter = FilterModel::new();
    for mode in CompareMode::ALL {
        assert!(matches(&dated("1999-01-01"), &filter, mode));
        assert!(matches(&ResultRow::new(), &filter, mode));
    }
}

#[test]
fn test_substring_is_case_sensitive() {
    let mut filter = FilterModel::new();
    filter.set_search_text(ColumnKey::ShortMsg, "bound");
    assert!(matches(&dated("2023"), &filter, CompareMode::Newer));
    filter.set_search_text(ColumnKey::ShortMsg, "Bound");
    assert!(!matches(&dated("2023"), &filter, CompareMode::Newer));
}

#[test]
fn test_all_columns_must_match() {
    let mut filter = FilterModel::new();
    filter.set_search_text(ColumnKey::ShortMsg, "unbound");
    filter.set_search_text(ColumnKey::Repo, "math");
    let row = dated("2023-01-01");
    assert!(!matches(&row, &filter, CompareMode::Newer));

    let mut with_repo = row.clone();
    with_repo.set(ColumnKey::Repo, "mathhub");
    assert!(matches(&with_repo, &filter, CompareMode::Newer));
}

#[test]
fn test_missing_value_fails_non_empty_search() {
    let mut filter = FilterModel::new();
    filter.set_search_text(ColumnKey::Target, "omdoc");
    assert!(!matches(&dated("2023"), &filter, CompareMode::Newer));
}

#[test]
fn test_numeric_values_are_stringified() {
    let row: ResultRow = serde_json::from_value(serde_json::json!({"errLevel": 12})).unwrap();
    let mut filter = FilterModel::new();
    filter.set_search_text(ColumnKey::ErrLevel, "2");
    assert!(matches(&row, &filter, CompareMode::Newer));
}

#[test]
fn test_select_keeps_order() {
    let rows = vec![dated("2023-03-01"), dated("2021-01-01"), dated("2023-01-01")];
    let mut filter = FilterModel::new();
    filter.set_search_text(ColumnKey::FileDate, "2022");
    let picked: Vec<_> = select(&rows, &filter, CompareMode::Newer)
        .map(|r| r.text_or_empty(ColumnKey::FileDate))
        .collect();
    assert_eq!(picked, vec!["2023-03-01", "2023-01-01"]);
}
