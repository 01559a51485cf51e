use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_NAME: &str = "predictor.log";
const DEFAULT_DIRECTIVE: &str = "immo_predictor=info";

/// Initializes the logging system with JSON file output and a console layer on stderr.
///
/// The returned guard flushes the file writer when dropped, so callers keep it
/// alive for the lifetime of the process.
pub fn init_logging(log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(non_blocking_writer);

    // stdout is reserved for command output
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVE))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(guard)
}
