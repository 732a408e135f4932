//! Rolling log file writer (feature `tracing-init`).
//!
//! The caller installs the subscriber and picks the event format; this module
//! only resolves the directory and builds the non-blocking writer.

use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

/// Non-blocking writer plus its flush guard. Keep the guard alive until exit;
/// dropping it flushes and stops the background writer.
pub struct FileLog {
    pub writer: NonBlocking,
    pub guard: WorkerGuard,
    pub dir: PathBuf,
}

/// `$XDG_STATE_HOME/<app>/logs`, else `~/.local/state/<app>/logs`.
pub fn log_dir(app_name: &str) -> PathBuf {
    let state_home = std::env::var_os("XDG_STATE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::state_dir)
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("state")))
        .unwrap_or_else(|| PathBuf::from("."));
    state_home.join(app_name).join("logs")
}

/// Daily-rolling `<prefix>.YYYY-MM-DD.log` files in `dir`, created if missing.
pub fn file_log_in(dir: &Path, prefix: &str) -> io::Result<FileLog> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    Ok(FileLog {
        writer,
        guard,
        dir: dir.to_path_buf(),
    })
}

/// Rolling log for `app_name` under [`log_dir`].
pub fn init_file_logging(app_name: &str) -> io::Result<FileLog> {
    file_log_in(&log_dir(app_name), app_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_ends_with_app_logs() {
        assert!(log_dir("docassist").ends_with("docassist/logs"));
    }

    #[test]
    fn file_log_creates_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("logs");
        let log = file_log_in(&target, "test").unwrap();
        assert!(target.is_dir());
        assert_eq!(log.dir, target);
    }
}
