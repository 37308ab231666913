use std::{fs, path::Path};

use fivemind_shell::app_constants::{DESKTOP_LOG_FILE, LOG_FILTER_ENV};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter(directive: Option<String>) -> EnvFilter {
    directive
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs console + daily-rolling file logging under `log_dir`.
///
/// The returned guard must stay alive for the file writer to keep flushing.
pub(crate) fn init_logging(log_dir: &Path) -> Result<WorkerGuard, String> {
    fs::create_dir_all(log_dir).map_err(|error| {
        format!(
            "Failed to create log directory {}: {error}",
            log_dir.display()
        )
    })?;

    let file_appender = rolling::daily(log_dir, DESKTOP_LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(log_filter(std::env::var(LOG_FILTER_ENV).ok()))
        .with(fmt::layer().with_ansi(true).with_target(true))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true),
        )
        .try_init()
        .map_err(|error| format!("Failed to install log subscriber: {error}"))?;

    tracing::info!(
        target: "startup",
        "logging initialized: {}",
        log_dir.join(DESKTOP_LOG_FILE).display()
    );
    Ok(guard)
}
