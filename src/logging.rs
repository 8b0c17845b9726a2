use crate::error::{SloanError, SloanResult};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "sloan.log";
const DEFAULT_LOG_FILTER: &str = "sloan_core=info,sloan=info";

/// Installs the global subscriber: stderr plus a daily-rolled `sloan.log` in `log_dir`.
///
/// `RUST_LOG` overrides the default filter. Keep the returned guard alive
/// for the life of the process or buffered file output is lost.
pub fn init_logging(log_dir: &Path) -> SloanResult<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| SloanError::Other(format!("failed to initialize logging: {e}")))?;

    Ok(guard)
}
