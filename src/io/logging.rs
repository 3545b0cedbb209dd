use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::model::config::LogConfig;

/// Environment variable that overrides the configured log filter
pub const LOG_ENV: &str = "PLANNER_LOG";

/// Install the global subscriber, writing to the configured log file.
///
/// The terminal belongs to the TUI, so diagnostics never go to stdout or
/// stderr. Keep the returned guard alive for the life of the program; dropping
/// it flushes the writer.
pub fn init_logging(config: &LogConfig) -> std::io::Result<Option<WorkerGuard>> {
    let path = config.file_path();
    let dir = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "planner.log".into());

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        // A subscriber is already installed (tests, embedding); drop ours.
        Err(_) => Ok(None),
    }
}
