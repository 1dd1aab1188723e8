//! Integration tests for wrapped-config crate.

use std::fs;
use wrapped_common::test_utils::{config_fixtures, create_temp_dir};
use wrapped_config::{ConfigCache, ConfigError, ConfigLoader};

#[test]
fn test_load_yaml_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("wrapped.yaml");
    fs::write(&path, config_fixtures::full_config_yaml()).unwrap();

    let config = ConfigLoader::load_config(&path).unwrap();
    assert_eq!(config.aggregation.milestone_hours, 100.0);
    assert_eq!(config.enrichment.requests_per_second, 5);
}

#[test]
fn test_load_toml_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("wrapped.toml");
    fs::write(
        &path,
        "[archive]\ndata_dir = \"/srv/wrapped\"\n\n[enrichment]\nbatch_size = 10\n",
    )
    .unwrap();

    let config = ConfigLoader::load_config(&path).unwrap();
    assert_eq!(config.archive.data_dir.to_str(), Some("/srv/wrapped"));
    assert_eq!(config.enrichment.batch_size, 10);
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = create_temp_dir();
    let path = dir.path().join("wrapped.yaml");
    fs::write(&path, "aggregation:\n  timezone_offset_hours: 20\n").unwrap();

    let err = ConfigLoader::load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("timezone_offset_hours"));
}

#[test]
fn test_load_rejects_unknown_extension() {
    let dir = create_temp_dir();
    let path = dir.path().join("wrapped.json");
    fs::write(&path, "{}").unwrap();

    assert!(matches!(
        ConfigLoader::load_config(&path),
        Err(ConfigError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_load_missing_file() {
    let dir = create_temp_dir();
    let path = dir.path().join("missing.yaml");
    let err = ConfigLoader::load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_explicit_path_wins_through_load() {
    let dir = create_temp_dir();
    let path = dir.path().join("custom.yml");
    fs::write(&path, "cache:\n  aggregate_capacity: 3\n").unwrap();

    let config = ConfigLoader::load(Some(&path)).unwrap();
    let cache = ConfigCache::new(config);
    assert_eq!(cache.get().cache.aggregate_capacity, 3);
}
