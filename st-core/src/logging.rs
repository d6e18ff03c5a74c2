//! Structured logging setup using the `tracing` ecosystem.
//!
//! Request and response lines emitted by the API client land here. Console
//! output goes to stderr so that CLI results on stdout stay machine-readable.

use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{StError, StResult};

/// Guard that keeps the non-blocking log writer alive.
/// Drop this to flush and close the log file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// Installs a compact stderr layer plus a daily-rotated file layer in
/// `log_dir`. With `json_output` the file layer writes one JSON object per
/// event, which keeps request metadata fields queryable.
pub fn init_logging(level: &str, log_dir: &Path, json_output: bool) -> StResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, "sailthru.log"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(console_layer);

    let installed = if json_output {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    };
    installed.map_err(|e| StError::Internal(format!("failed to install subscriber: {e}")))?;

    tracing::info!("logging initialized at level={level}, dir={}", log_dir.display());

    Ok(LogGuard { _guard: guard })
}

/// Initialize logging from a [`LoggingConfig`], resolving its directory.
pub fn init_from_config(config: &LoggingConfig) -> StResult<LogGuard> {
    let dir = config.effective_directory()?;
    init_logging(&config.level, &dir, config.json_output)
}

/// Initialize a minimal console-only logger for testing or simple CLI usage.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_logging_does_not_panic() {
        // Subsequent calls are no-ops.
        init_console_logging("debug");
        init_console_logging("not a level");
    }

    #[test]
    fn test_init_from_config_uses_configured_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let config = LoggingConfig {
            level: "info".into(),
            directory: dir.to_string_lossy().into_owned(),
            json_output: true,
        };
        // Another test may already own the global subscriber.
        let _guard = init_from_config(&config);
        assert!(dir.is_dir());
    }
}
