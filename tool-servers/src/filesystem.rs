//! File tools confined to a base directory.
//!
//! Paths are resolved lexically (`.` and `..` are folded without touching the
//! disk) and must stay inside the base directory.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

use docassist::tool_source::{ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};
use docassist::tools::Tool;

pub const TOOL_WRITE_FILE: &str = "write_file";
pub const TOOL_APPEND_TO_FILE: &str = "append_to_file";
pub const TOOL_READ_FILE: &str = "read_file";

pub const OUTSIDE_BASE: &str = "Invalid path: outside of allowed base directory";

/// Folds `.` and `..` components. `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Root every file tool works under.
#[derive(Debug, Clone)]
pub struct BaseDir {
    root: PathBuf,
}

impl BaseDir {
    /// `root` is made absolute against the current directory and normalized.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self {
            root: normalize(&absolute),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for `relative_path`, or an error when it leaves the base.
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, ToolSourceError> {
        let resolved = normalize(&self.root.join(relative_path));
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            tracing::warn!(relative_path, "path escapes base directory");
            Err(ToolSourceError::InvalidInput(OUTSIDE_BASE.to_string()))
        }
    }
}

fn path_arg(args: &Value) -> Result<&str, ToolSourceError> {
    args.get("relative_path")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolSourceError::InvalidInput("relative_path is required".to_string()))
}

fn content_arg(args: &Value) -> Result<&str, ToolSourceError> {
    args.get("content")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolSourceError::InvalidInput("content is required".to_string()))
}

fn io_failed(action: &str, path: &str, e: io::Error) -> ToolSourceError {
    ToolSourceError::Transport(format!("Error {} {}: {}", action, path, e))
}

fn spec(name: &str, description: &str, with_content: bool) -> ToolSpec {
    let mut properties = json!({
        "relative_path": {
            "type": "string",
            "description": "Path relative to the server's base directory"
        }
    });
    let mut required = vec!["relative_path"];
    if with_content {
        properties["content"] = json!({ "type": "string", "description": "Text to write" });
        required.push("content");
    }
    ToolSpec {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required
        }),
    }
}

#[derive(Clone, Copy)]
enum WriteMode {
    Truncate,
    Append,
}

/// `write_file` or `append_to_file`, depending on the mode.
pub struct WriteTool {
    base: Arc<BaseDir>,
    mode: WriteMode,
}

impl WriteTool {
    pub fn write(base: Arc<BaseDir>) -> Self {
        Self {
            base,
            mode: WriteMode::Truncate,
        }
    }

    pub fn append(base: Arc<BaseDir>) -> Self {
        Self {
            base,
            mode: WriteMode::Append,
        }
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        match self.mode {
            WriteMode::Truncate => TOOL_WRITE_FILE,
            WriteMode::Append => TOOL_APPEND_TO_FILE,
        }
    }

    fn spec(&self) -> ToolSpec {
        match self.mode {
            WriteMode::Truncate => spec(
                TOOL_WRITE_FILE,
                "Write text to a file, replacing it. Parent directories are created.",
                true,
            ),
            WriteMode::Append => spec(
                TOOL_APPEND_TO_FILE,
                "Append text to a file, creating it if needed.",
                true,
            ),
        }
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let relative_path = path_arg(&args)?;
        let content = content_arg(&args)?;
        let path = self.base.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_failed("creating directories for", relative_path, e))?;
        }

        let chars = content.chars().count();
        let message = match self.mode {
            WriteMode::Truncate => {
                tokio::fs::write(&path, content)
                    .await
                    .map_err(|e| io_failed("writing", relative_path, e))?;
                format!("Wrote {} characters to {}", chars, relative_path)
            }
            WriteMode::Append => {
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await
                    .map_err(|e| io_failed("opening", relative_path, e))?;
                file.write_all(content.as_bytes())
                    .await
                    .map_err(|e| io_failed("appending to", relative_path, e))?;
                file.flush()
                    .await
                    .map_err(|e| io_failed("appending to", relative_path, e))?;
                format!("Appended {} characters to {}", chars, relative_path)
            }
        };
        tracing::info!(path = %path.display(), chars, "file written");
        Ok(ToolCallContent::new(message))
    }
}

pub struct ReadFileTool {
    base: Arc<BaseDir>,
}

impl ReadFileTool {
    pub fn new(base: Arc<BaseDir>) -> Self {
        Self { base }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        TOOL_READ_FILE
    }

    fn spec(&self) -> ToolSpec {
        spec(TOOL_READ_FILE, "Read a text file.", false)
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let relative_path = path_arg(&args)?;
        let path = self.base.resolve(relative_path)?;
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_failed("reading", relative_path, e))?;
        Ok(ToolCallContent::new(text))
    }
}

/// The three file tools over one base directory.
pub fn filesystem_tools(base: BaseDir) -> Vec<Arc<dyn Tool>> {
    let base = Arc::new(base);
    vec![
        Arc::new(WriteTool::write(base.clone())),
        Arc::new(WriteTool::append(base.clone())),
        Arc::new(ReadFileTool::new(base)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn resolve_rejects_escapes() {
        let base = BaseDir::new("/srv/out").unwrap();
        assert_eq!(
            base.resolve("notes/summary.txt").unwrap(),
            PathBuf::from("/srv/out/notes/summary.txt")
        );
        assert_eq!(
            base.resolve("a/../b.txt").unwrap(),
            PathBuf::from("/srv/out/b.txt")
        );
        for bad in ["../secret", "a/../../x", "/etc/passwd", "../out-other/x"] {
            let err = base.resolve(bad).unwrap_err();
            assert!(err.to_string().contains(OUTSIDE_BASE), "{}", bad);
        }
    }

    #[tokio::test]
    async fn write_append_read() {
        let dir = tempfile::tempdir().unwrap();
        let tools = filesystem_tools(BaseDir::new(dir.path()).unwrap());
        let (write, append, read) = (&tools[0], &tools[1], &tools[2]);

        let out = write
            .call(json!({"relative_path": "deep/dir/summary.txt", "content": "héllo"}), None)
            .await
            .unwrap();
        assert_eq!(out.text, "Wrote 5 characters to deep/dir/summary.txt");

        let out = append
            .call(json!({"relative_path": "deep/dir/summary.txt", "content": " world"}), None)
            .await
            .unwrap();
        assert_eq!(out.text, "Appended 6 characters to deep/dir/summary.txt");

        let out = read
            .call(json!({"relative_path": "deep/dir/summary.txt"}), None)
            .await
            .unwrap();
        assert_eq!(out.text, "héllo world");
    }

    #[tokio::test]
    async fn errors_for_missing_args_escapes_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let tools = filesystem_tools(BaseDir::new(dir.path()).unwrap());
        assert!(matches!(
            tools[0].call(json!({"relative_path": "x"}), None).await,
            Err(ToolSourceError::InvalidInput(_))
        ));
        assert!(matches!(
            tools[0]
                .call(json!({"relative_path": "../x", "content": "c"}), None)
                .await,
            Err(ToolSourceError::InvalidInput(m)) if m == OUTSIDE_BASE
        ));
        assert!(matches!(
            tools[2].call(json!({"relative_path": "absent.txt"}), None).await,
            Err(ToolSourceError::Transport(m)) if m.starts_with("Error reading absent.txt")
        ));
    }
}
