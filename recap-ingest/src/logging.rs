//! Log file output
//!
//! The console layer is always installed by `main`; when `logging.file`
//! is configured, events are also written to that file through a
//! non-blocking appender.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

/// Open `path` for appending and return a non-blocking writer
///
/// Missing parent directories are created. The returned guard flushes
/// pending lines when dropped, so it must live as long as logging does.
pub fn open_log_file(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
