//! Logging initialization.

use tracing::*;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use super::types::LoggerConfig;

/// Dependencies whose INFO output is mostly connection chatter.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Builds the filter shared by every layer.
///
/// `default_level` applies when `RUST_LOG` is absent; `RUST_LOG` still
/// overrides it, and noisy HTTP dependencies are capped at WARN.
pub fn build_filter(default_level: Level) -> EnvFilter {
    let mut filt = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    for target in QUIET_TARGETS {
        if let Ok(directive) = target.parse() {
            filt = filt.add_directive(directive);
        }
    }
    filt
}

/// Assembles the stdout layer and the optional rolling file layer.
pub(crate) fn build_subscriber(config: &LoggerConfig) -> impl Subscriber + Send + Sync + 'static {
    let filt = build_filter(config.default_level);

    let stdout_sub = if config.stdout_config.json_format {
        layer()
            .json()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed()
    } else {
        layer()
            .compact()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed()
    };

    let file_layer = config.file_logging_config.as_ref().map(|file_config| {
        let file_appender = RollingFileAppender::new(
            file_config.rotation.clone(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );

        if file_config.json_format {
            layer()
                .json()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(filt.clone())
                .boxed()
        } else {
            layer()
                .compact()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(filt.clone())
                .boxed()
        }
    });

    tracing_subscriber::registry()
        .with(stdout_sub)
        .with(file_layer)
}

/// Installs the global subscriber described by `config`.
///
/// Panics if a global subscriber is already set.
pub fn init(config: LoggerConfig) {
    build_subscriber(&config).init();

    info!(
        service_name = %config.service_name,
        default_level = %config.default_level,
        "logging initialized"
    );
}
