//! Project `.env` reading; parsing is left to the `dotenv` crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

fn dotenv_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    Some(dir.join(".env")).filter(|p| p.is_file())
}

/// Variables of `.env` in `override_dir` (or the current directory).
/// No file means an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = dotenv_path(override_dir) else {
        return Ok(HashMap::new());
    };
    ::dotenv::from_path_iter(&path)
        .map_err(LoadError::DotenvRead)?
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(LoadError::DotenvRead)
}
