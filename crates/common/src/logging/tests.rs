//! Unit tests for the logging configuration helpers.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::format::FmtSpan;

use super::{format_service_name, service::logger_config, types::*, LoggingInitConfig};

fn init_config<'a>(log_dir: Option<&'a PathBuf>) -> LoggingInitConfig<'a> {
    LoggingInitConfig {
        service_base_name: "gateway-anchor",
        service_label: None,
        log_dir,
        log_file_prefix: None,
        json_format: None,
        default_log_prefix: "gateway-anchor",
    }
}

#[test]
fn test_format_service_name() {
    assert_eq!(format_service_name("gateway-anchor", None), "gateway-anchor");
    assert_eq!(
        format_service_name("gateway-anchor", Some("dev")),
        "gateway-anchor%dev"
    );
}

#[test]
fn test_logger_config_defaults() {
    let config = LoggerConfig::new("svc".to_string());
    assert_eq!(config.service_name, "svc");
    assert_eq!(config.default_level, Level::INFO);
    assert!(!config.stdout_config.json_format);
    assert!(config.file_logging_config.is_none());
}

#[test]
fn test_logger_config_builder_pattern() {
    let config = LoggerConfig::new("svc".to_string())
        .with_default_level(Level::DEBUG)
        .with_json_logging(true)
        .with_fmt_span(FmtSpan::NONE)
        .with_file_logging(
            FileLoggingConfig::new(PathBuf::from("/tmp/logs"), "svc".to_string())
                .with_rotation(Rotation::HOURLY),
        );

    assert_eq!(config.default_level, Level::DEBUG);
    assert!(config.stdout_config.json_format);
    let file = config.file_logging_config.unwrap();
    assert_eq!(file.directory, PathBuf::from("/tmp/logs"));
    assert_eq!(file.rotation, Rotation::HOURLY);
    assert!(!file.json_format);
}

#[test]
fn test_init_config_without_log_dir() {
    let lconfig = logger_config(&init_config(None));
    assert_eq!(lconfig.service_name, "gateway-anchor");
    assert!(lconfig.file_logging_config.is_none());
}

#[test]
fn test_init_config_uses_default_prefix() {
    let dir = PathBuf::from("/var/log/gateway");
    let lconfig = logger_config(&init_config(Some(&dir)));
    let file = lconfig.file_logging_config.unwrap();
    assert_eq!(file.directory, dir);
    assert_eq!(file.file_name_prefix, "gateway-anchor");
}

#[test]
fn test_init_config_label_prefix_and_json() {
    let dir = PathBuf::from("/var/log/gateway");
    let lconfig = logger_config(&LoggingInitConfig {
        service_label: Some("prod"),
        log_file_prefix: Some("anchor"),
        json_format: Some(true),
        ..init_config(Some(&dir))
    });

    assert_eq!(lconfig.service_name, "gateway-anchor%prod");
    assert!(lconfig.stdout_config.json_format);
    let file = lconfig.file_logging_config.unwrap();
    assert_eq!(file.file_name_prefix, "anchor");
    assert!(file.json_format);
}
