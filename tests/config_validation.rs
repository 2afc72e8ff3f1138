//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use mqtt_codec::config::{CodecConfig, LoggingConfig, MAX_PACKET_SIZE};
use mqtt_codec::CodecError;
use std::io::Write;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = CodecConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
    assert_eq!(config.max_packet_size, MAX_PACKET_SIZE);
}

#[test]
fn test_max_packet_size_too_small() {
    let config = CodecConfig::default_with_overrides(|c| c.max_packet_size = 1);
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("too small")));
}

#[test]
fn test_max_packet_size_too_large() {
    let config = CodecConfig::default_with_overrides(|c| c.max_packet_size = MAX_PACKET_SIZE + 1);
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("too large")));
}

#[test]
fn test_empty_app_name() {
    let mut config = CodecConfig::default();
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(!errors.is_empty());
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_long_app_name() {
    let mut config = CodecConfig::default();
    config.logging.app_name = "x".repeat(65);
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Application name too long")));
}

#[test]
fn test_multiple_errors_collected() {
    let config = CodecConfig::default_with_overrides(|c| {
        c.max_packet_size = 0;
        c.logging.app_name = String::new();
    });
    assert_eq!(config.validate().len(), 2);

    let err = config.validate_strict().unwrap_err();
    assert!(matches!(err, CodecError::ConfigError(_)));
    assert!(err.to_string().contains("Configuration validation failed"));
}

#[test]
fn test_from_toml() {
    let config = CodecConfig::from_toml(
        r#"
        max_packet_size = 65536

        [logging]
        log_level = "debug"
        "#,
    )
    .expect("valid TOML");

    assert_eq!(config.max_packet_size, 65536);
    assert_eq!(config.logging.log_level, Level::DEBUG);
    // Unspecified fields keep their defaults
    assert_eq!(config.logging.app_name, LoggingConfig::default().app_name);
    assert!(config.validate_strict().is_ok());
}

#[test]
fn test_from_toml_rejects_bad_level() {
    let err = CodecConfig::from_toml("[logging]\nlog_level = \"loud\"\n").unwrap_err();
    assert!(matches!(err, CodecError::ConfigError(_)));
}

#[test]
fn test_example_config_parses_back() {
    let text = CodecConfig::example_config();
    assert!(text.contains("max_packet_size"));
    let parsed = CodecConfig::from_toml(&text).expect("example config should parse");
    assert_eq!(parsed.max_packet_size, MAX_PACKET_SIZE);
    assert_eq!(parsed.logging.log_level, Level::INFO);
}

#[test]
fn test_from_file() {
    let path = std::env::temp_dir().join(format!("mqtt-codec-test-{}.toml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "max_packet_size = 1024").unwrap();
    }
    let config = CodecConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.max_packet_size, 1024);

    assert!(matches!(
        CodecConfig::from_file("/definitely/not/here.toml"),
        Err(CodecError::ConfigError(_))
    ));
}

#[test]
fn test_from_env() {
    std::env::set_var("MQTT_CODEC_MAX_PACKET_SIZE", "4096");
    std::env::set_var("MQTT_CODEC_LOG_LEVEL", "warn");
    let config = CodecConfig::from_env().unwrap();
    assert_eq!(config.max_packet_size, 4096);
    assert_eq!(config.logging.log_level, Level::WARN);

    std::env::set_var("MQTT_CODEC_MAX_PACKET_SIZE", "lots");
    assert!(CodecConfig::from_env().is_err());

    std::env::remove_var("MQTT_CODEC_MAX_PACKET_SIZE");
    std::env::remove_var("MQTT_CODEC_LOG_LEVEL");
}
