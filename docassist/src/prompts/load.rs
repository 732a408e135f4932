//! Load prompts from a directory containing `assistant.yaml`, or from the
//! embedded copy.

use std::path::{Path, PathBuf};

use super::AssistantPrompts;

/// File name looked up in the prompts directory.
pub const PROMPTS_FILE: &str = "assistant.yaml";

const EMBED_ASSISTANT: &str = include_str!("../../prompts/assistant.yaml");

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("prompts directory not found or not readable: {0}")]
    DirNotFound(String),
    #[error("failed to read prompts file {path}: {message}")]
    ReadFile { path: String, message: String },
    #[error("failed to parse YAML in {path}: {message}")]
    ParseYaml { path: String, message: String },
}

/// `dir` if given, else `PROMPTS_DIR`.
fn prompts_dir(dir: Option<&Path>) -> Option<PathBuf> {
    dir.map(PathBuf::from)
        .or_else(|| std::env::var("PROMPTS_DIR").ok().map(PathBuf::from))
}

/// Reads `assistant.yaml` from `dir`.
pub fn load(dir: &Path) -> Result<AssistantPrompts, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::DirNotFound(dir.display().to_string()));
    }
    let path = dir.join(PROMPTS_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| LoadError::ReadFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|e| LoadError::ParseYaml {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Parses the embedded `assistant.yaml`.
pub fn default_from_embedded() -> AssistantPrompts {
    serde_yaml::from_str(EMBED_ASSISTANT).unwrap_or_default()
}

/// Loads from `dir` (or `PROMPTS_DIR`) when present, else the embedded prompts.
/// A directory that exists but fails to load is logged and ignored.
pub fn load_or_default(dir: Option<&Path>) -> AssistantPrompts {
    match prompts_dir(dir) {
        Some(d) => load(&d).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using embedded prompts");
            default_from_embedded()
        }),
        None => default_from_embedded(),
    }
}
