//! Logging configuration for the knowledge explorer

use std::path::Path;

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::errors::ExplorerError;
use crate::Result;

const LOG_FILE_PREFIX: &str = "knowledge-explorer.log";

/// Filter directives for a level: the level for dependencies, and the same
/// level for this crate unless `verbose` raises it to debug
pub fn filter_directives(level: &str, verbose: bool) -> String {
    let own = if verbose { "debug" } else { level };
    format!("{level},knowledge_explorer={own}")
}

/// Initialize logging with console and daily-rolling file output
///
/// `RUST_LOG`, when set, replaces the configured level.
pub fn init_logging_with_config(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let logs_dir = Path::new(&config.directory);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.level, verbose)));

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(verbose)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false);

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ExplorerError::ConfigError(format!("Failed to initialize logging: {e}")))?;

    if config.backtrace && std::env::var_os("RUST_BACKTRACE").is_none() {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    tracing::info!("Logging initialized with level: {}", config.level);
    tracing::info!(
        "Log files will be saved to: {}/{}.YYYY-MM-DD",
        logs_dir.display(),
        LOG_FILE_PREFIX
    );

    // The writer thread stops when the guard drops
    std::mem::forget(guard);

    Ok(())
}
