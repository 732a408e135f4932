//! Tool usage log, persisted as a pretty JSON array after every entry.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Logger shared by every tool of one assistant; replaced on each new session.
pub type SharedToolLogger = Arc<Mutex<ToolLogger>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolLogEntry {
    /// Local time, ISO 8601 without offset.
    pub timestamp: String,
    pub tool_name: String,
    pub input: Value,
    pub output: String,
}

#[derive(Debug)]
pub struct ToolLogger {
    logs: Vec<ToolLogEntry>,
    log_file: PathBuf,
}

impl ToolLogger {
    /// Log file is `logs_dir/session_{id}.json`, or `logs_dir/tool_usage_{YYYYmmdd_HHMMSS}.json`
    /// without a session.
    pub fn new(logs_dir: impl AsRef<Path>, session_id: Option<&str>) -> Self {
        let logs_dir = logs_dir.as_ref();
        if let Err(e) = std::fs::create_dir_all(logs_dir) {
            tracing::warn!(dir = %logs_dir.display(), error = %e, "cannot create logs directory");
        }
        let file_name = match session_id {
            Some(id) => format!("session_{}.json", id),
            None => format!(
                "tool_usage_{}.json",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            ),
        };
        Self {
            logs: Vec::new(),
            log_file: logs_dir.join(file_name),
        }
    }

    pub fn shared(logs_dir: impl AsRef<Path>, session_id: Option<&str>) -> SharedToolLogger {
        Arc::new(Mutex::new(Self::new(logs_dir, session_id)))
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    fn record(&mut self, tool_name: &str, input: Value, output: String) -> ToolLogEntry {
        let entry = ToolLogEntry {
            timestamp: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            tool_name: tool_name.to_string(),
            input,
            output,
        };
        self.logs.push(entry.clone());
        entry
    }

    /// Appends an entry and rewrites the log file. A failed write only warns.
    ///
    /// Blocks on the write; async callers go through [`log_shared`].
    pub fn log_tool_use(
        &mut self,
        tool_name: &str,
        input: Value,
        output: impl Into<String>,
    ) -> ToolLogEntry {
        let entry = self.record(tool_name, input, output.into());
        if let Err(e) = write_pretty(&self.log_file, &self.logs) {
            warn_unsaved(&self.log_file, &e);
        }
        entry
    }

    pub fn get_logs(&self) -> &[ToolLogEntry] {
        &self.logs
    }

    pub fn save_logs(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        write_pretty(path.as_ref(), &self.logs)
    }
}

fn write_pretty(path: &Path, logs: &[ToolLogEntry]) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(logs).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

fn warn_unsaved(file: &Path, e: &dyn std::fmt::Display) {
    tracing::warn!(file = %file.display(), error = %e, "failed to auto-save tool logs");
}

/// Appends through a shared logger, then rewrites the file on the blocking
/// pool. The lock is released before the write; a poisoned lock skips the
/// entry with a warning.
pub(crate) async fn log_shared(
    logger: &SharedToolLogger,
    tool_name: &str,
    input: Value,
    output: impl Into<String>,
) {
    let snapshot = match logger.lock() {
        Ok(mut guard) => {
            guard.record(tool_name, input, output.into());
            (
                guard.log_file.clone(),
                serde_json::to_string_pretty(&guard.logs),
            )
        }
        Err(_) => {
            tracing::warn!(tool = tool_name, "tool logger lock poisoned; entry dropped");
            return;
        }
    };
    let (file, json) = match snapshot {
        (file, Ok(json)) => (file, json),
        (file, Err(e)) => return warn_unsaved(&file, &e),
    };
    let target = file.clone();
    match tokio::task::spawn_blocking(move || std::fs::write(target, json)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn_unsaved(&file, &e),
        Err(e) => warn_unsaved(&file, &e),
    }
}
