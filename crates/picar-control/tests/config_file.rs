//! 配置文件读写

use std::fs;

use picar_control::{ConfigError, CrossAction, RobotConfig, RobotVariant};
use tempfile::TempDir;

#[test]
fn save_and_load_preserves_preset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("robot.toml");

    let config = RobotConfig::preset(RobotVariant::Mk2);
    config.save(&path).unwrap();
    let loaded = RobotConfig::load(&path).unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loaded.hardware.line_pins.left, 22);
    assert!(loaded.hardware.motors.iter().all(|m| m.inverted));
}

#[test]
fn partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("robot.toml");
    fs::write(
        &path,
        r#"
[line]
base_speed = 0.3
backward_cross = "pause"

[scenario]
backward_follow_ms = 3500
"#,
    )
    .unwrap();

    let config = RobotConfig::load(&path).unwrap();
    assert_eq!(config.line.base_speed, 0.3);
    assert_eq!(config.line.backward_cross, CrossAction::Pause);
    assert_eq!(config.line.kp, 34.0);
    assert_eq!(config.scenario.backward_follow_ms, Some(3500));
    assert_eq!(config.scenario.forward_follow_ms, Some(2000));
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = RobotConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("robot.toml");
    fs::write(&path, "[line]\nmin_speed = 1.5\n").unwrap();

    let err = RobotConfig::load(&path).unwrap_err();
    assert!(format!("{}", err).contains("line.min_speed"), "{}", err);
}
