//! Configuration tests

use super::*;
use orphanage_cluster::TargetKind;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(config, parsed);
}

#[test]
fn test_config_from_file() {
    let mut config = Config::default();
    config.controller.event_buffer = 16;
    config.scan.default_kinds = vec!["Secret".to_string()];

    let temp_file = NamedTempFile::new().unwrap();
    config.save_to_file(temp_file.path()).unwrap();

    let loaded = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config, loaded);
    assert_eq!(
        loaded.scan.monitored_kinds().unwrap(),
        vec![TargetKind::Secret]
    );
}

#[test]
fn test_partial_file_uses_defaults() {
    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(
        temp_file.path(),
        "version: \"1.0\"\ncontroller:\n  backoff:\n    initial_ms: 100\n",
    )
    .unwrap();

    let loaded = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(loaded.controller.backoff.initial_ms, 100);
    assert_eq!(loaded.controller.backoff.multiplier, 2.0);
    assert_eq!(loaded.controller.event_buffer, 256);
    assert_eq!(loaded.scan, ScanConfig::default());
}

#[test]
fn test_config_validation() {
    assert!(Config::default().validate().is_ok());

    let mut config = Config::default();
    config.version = "2.0".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.controller.backoff.max_ms = 1;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.controller.backoff.multiplier = 0.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.scan.default_kinds = vec!["Service".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_explicit_config_must_exist() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.yaml");

    assert!(Config::locate(Some(missing.to_str().unwrap())).is_err());
}

#[test]
fn test_expand_path_substitutes_environment() {
    std::env::set_var("ORPHANAGE_TEST_DIR", "/tmp/orphanage");
    let path = expand_path("$ORPHANAGE_TEST_DIR/config.yaml").unwrap();
    assert_eq!(path, std::path::PathBuf::from("/tmp/orphanage/config.yaml"));
}

#[test]
fn test_output_format_parsing() {
    assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    assert!("xml".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Yaml.to_string(), "yaml");
}
