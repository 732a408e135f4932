//! Configuration for DocAssist.
//!
//! * [`load_and_apply`] fills the process environment from a project `.env`
//!   and `$XDG_CONFIG_HOME/<app>/config.toml`, with priority
//!   **existing env > .env > XDG**.
//! * [`mcp`] holds the MCP server map: which tool servers to spawn and how.
//! * With the `tracing-init` feature, [`logging`] builds the rolling log file writer.

mod dotenv;
#[cfg(feature = "tracing-init")]
pub mod logging;
pub mod mcp;
mod xdg_toml;

pub use mcp::{default_servers, load_servers, McpServerConfig, McpServers};

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(::dotenv::Error),
    #[error("read mcp config {path}: {source}")]
    McpRead {
        path: String,
        source: std::io::Error,
    },
    #[error("parse mcp config: {0}")]
    McpParse(#[from] serde_json::Error),
}

/// Picks, for every key of either file, the value to set: `.env` beats XDG.
/// Keys already in the process environment are left out.
fn merge_missing(
    dotenv_map: HashMap<String, String>,
    xdg_map: HashMap<String, String>,
    is_set: impl Fn(&str) -> bool,
) -> HashMap<String, String> {
    let mut merged = xdg_map;
    merged.extend(dotenv_map);
    merged.retain(|key, _| !is_set(key));
    merged
}

/// Loads `config.toml` `[env]` and `.env`, then sets every variable that is
/// not already present in the process environment.
///
/// * `app_name`: directory under the XDG config home, e.g. `"docassist"`.
/// * `override_dir`: where to look for `.env`; defaults to the current directory.
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir)?;
    let merged = merge_missing(dotenv_map, xdg_map, |key| std::env::var_os(key).is_some());
    for (key, value) in merged {
        std::env::set_var(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn dotenv_beats_xdg_and_env_beats_both() {
        let merged = merge_missing(
            map(&[("A", "dotenv"), ("B", "dotenv")]),
            map(&[("A", "xdg"), ("C", "xdg"), ("SET", "xdg")]),
            |k| k == "SET",
        );
        assert_eq!(merged, map(&[("A", "dotenv"), ("B", "dotenv"), ("C", "xdg")]));
    }

    #[test]
    fn existing_env_is_kept() {
        env::set_var("DOCASSIST_CONFIG_TEST_EXISTING", "from_env");
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "DOCASSIST_CONFIG_TEST_EXISTING=from_dotenv\n",
        )
        .unwrap();
        load_and_apply("docassist-config-test-none", Some(dir.path())).unwrap();
        assert_eq!(
            env::var("DOCASSIST_CONFIG_TEST_EXISTING").as_deref(),
            Ok("from_env")
        );
        env::remove_var("DOCASSIST_CONFIG_TEST_EXISTING");
    }

    #[test]
    fn dotenv_values_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "# comment\nDOCASSIST_CONFIG_TEST_DOTENV=\"from dotenv\"\n",
        )
        .unwrap();
        env::remove_var("DOCASSIST_CONFIG_TEST_DOTENV");
        load_and_apply("docassist-config-test-none", Some(dir.path())).unwrap();
        let value = env::var("DOCASSIST_CONFIG_TEST_DOTENV");
        env::remove_var("DOCASSIST_CONFIG_TEST_DOTENV");
        assert_eq!(value.as_deref(), Ok("from dotenv"));
    }

    #[test]
    fn missing_files_are_fine() {
        let empty = tempfile::tempdir().unwrap();
        assert!(load_and_apply("docassist-config-test-none", Some(empty.path())).is_ok());
    }
}
