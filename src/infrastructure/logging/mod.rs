//! Logging setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::application::errors::ConfigError;
use crate::infrastructure::config::LoggingConfig;

/// Install the global subscriber: stdout always, plus a daily rolling file when
/// a directory is configured. Keep the returned guard alive until exit or
/// buffered file lines are lost.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    let stdout = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(env_filter(&config.level)?);

    let Some(directory) = &config.directory else {
        tracing_subscriber::registry().with(stdout).init();
        return Ok(None);
    };

    std::fs::create_dir_all(directory).map_err(|e| {
        ConfigError::InvalidValue(format!("log directory {}: {}", directory.display(), e))
    })?;
    let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(env_filter(&config.level)?);

    tracing_subscriber::registry().with(stdout).with(file).init();
    Ok(Some(guard))
}

/// `RUST_LOG` wins; the configured level is the fallback.
fn env_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|e| ConfigError::InvalidValue(format!("logging.level {:?}: {}", level, e))),
    }
}
