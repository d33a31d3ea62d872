//! 配置文件读写测试

use notebot_notes::{ConfigError, NoteConfig};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.toml");

    let mut config = NoteConfig::default();
    config.timing.feed_settle = 0.8;
    config.sysid.step_voltage = 4.0;
    config.save_to_file(&path).unwrap();

    let loaded = NoteConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.timing().unwrap().feed_settle, Duration::from_millis(800));
    assert_eq!(loaded.sysid().unwrap().step_voltage, 4.0);
}

#[test]
fn test_load_rejects_negative_duration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.toml");
    std::fs::write(&path, "[timing]\nauto_center_standalone = -1.0\n").unwrap();

    let err = NoteConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "timing.auto_center_standalone",
            ..
        }
    ));
    assert!(err.to_string().contains("auto_center_standalone"));
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = NoteConfig::load_from_file(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_load_empty_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.toml");
    std::fs::write(&path, "").unwrap();

    let loaded = NoteConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, NoteConfig::default());
}
