//! Common logging service initialization for binaries.

use std::path::PathBuf;

use tracing::info;

use super::{format_service_name, init, FileLoggingConfig, LoggerConfig};

/// Configuration parameters for logging initialization.
#[derive(Debug)]
pub struct LoggingInitConfig<'a> {
    /// Base service name
    pub service_base_name: &'a str,
    /// Optional service label to append like prod or dev
    pub service_label: Option<&'a str>,
    /// Directory for file-based logging
    pub log_dir: Option<&'a PathBuf>,
    /// Prefix for log file names
    pub log_file_prefix: Option<&'a str>,
    /// Use JSON format instead of compact
    pub json_format: Option<bool>,
    /// Default log file prefix if not specified in config
    pub default_log_prefix: &'a str,
}

/// Translates the parameters into a [`LoggerConfig`].
pub(crate) fn logger_config(config: &LoggingInitConfig<'_>) -> LoggerConfig {
    let service_name = format_service_name(config.service_base_name, config.service_label);
    let mut lconfig = LoggerConfig::new(service_name);

    if let Some(dir) = config.log_dir {
        let prefix = config
            .log_file_prefix
            .unwrap_or(config.default_log_prefix)
            .to_string();
        lconfig = lconfig.with_file_logging(FileLoggingConfig::new(dir.clone(), prefix));
    }

    if let Some(json_format) = config.json_format {
        lconfig = lconfig.with_json_logging(json_format);
        if let Some(file_config) = lconfig.file_logging_config.take() {
            lconfig.file_logging_config = Some(file_config.with_json_format(json_format));
        }
    }

    lconfig
}

/// Initialize logging from configuration with all standard setup.
pub fn init_logging_from_config(config: LoggingInitConfig<'_>) {
    let lconfig = logger_config(&config);
    let file_logging_config = lconfig.file_logging_config.clone();

    init(lconfig);

    if let Some(file_config) = &file_logging_config {
        info!(
            log_dir = %file_config.directory.display(),
            log_prefix = %file_config.file_name_prefix,
            "file logging enabled"
        );
    }
}
