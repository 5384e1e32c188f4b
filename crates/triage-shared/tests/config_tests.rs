//! Tests for configuration loading.

use std::path::Path;
use tempfile::TempDir;
use triage_shared::config::{TriageConfig, ViewConfig};
use triage_shared::{ColumnKey, CompareMode, TriageError};

#[test]
fn test_defaults() {
    let config = TriageConfig::default();
    assert_eq!(config.server.base_url, "http://localhost:8080");
    assert_eq!(config.view.max_number, 100);
    assert_eq!(config.view.max_groups, 6);
    assert_eq!(config.view.active_field, ColumnKey::ShortMsg);
    assert_eq!(config.view.compare, CompareMode::Newer);
    assert_eq!(config.view.build_level.as_str(), "0");
    assert!(config.view.show_build_result);
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_partial_file_keeps_defaults() {
    let config = TriageConfig::parse(
        r#"
[server]
base_url = "http://mathhub.info:8080"

[view]
compare = "older"
active_field = "repo"
build_level = "2"
"#,
    )
    .unwrap();
    assert_eq!(config.server.base_url, "http://mathhub.info:8080");
    assert_eq!(config.view.compare, CompareMode::Older);
    assert_eq!(config.view.active_field, ColumnKey::Repo);
    assert_eq!(config.view.build_level.as_str(), "2");
    assert_eq!(config.view.max_groups, 6);
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_malformed_file_is_config_error() {
    let err = TriageConfig::parse("[view]\ncompare = \"contains\"\n").unwrap_err();
    assert!(matches!(err, TriageError::Config(_)));
}

#[test]
fn test_effective_values_are_clamped() {
    let view = ViewConfig {
        max_number: 0,
        max_groups: 1_000,
        active_field: ColumnKey::FileLink,
        ..ViewConfig::default()
    };
    assert_eq!(view.effective_max_number(), 1);
    assert_eq!(view.effective_max_groups(), 100);
    assert_eq!(view.effective_active_field(), ColumnKey::ShortMsg);
}

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = TriageConfig::default();
    config.view.max_number = 250;
    config.log.level = "debug".to_string();
    config.save_to(&path).unwrap();

    let loaded = TriageConfig::load(Some(&path)).unwrap();
    assert_eq!(loaded.view.max_number, 250);
    assert_eq!(loaded.log.level, "debug");
}

#[test]
fn test_missing_explicit_file_yields_defaults() {
    let config = TriageConfig::load(Some(Path::new("/nonexistent/triagectl.toml"))).unwrap();
    assert_eq!(config.view.max_number, 100);
}

#[test]
fn test_explicit_path_wins() {
    let path = Path::new("/tmp/explicit.toml");
    assert_eq!(TriageConfig::discover_path(Some(path)).as_deref(), Some(path));
}
