pub mod add;
pub mod commit;
pub mod init;
pub mod log;
pub mod restore;
pub mod show;
pub mod status;

use anyhow::{Context, Result};
use grits_core::Repository;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The directory commands run in: `-C <dir>` or the current directory.
pub fn working_dir(custom_path: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match custom_path {
        Some(path) => path,
        None => std::env::current_dir().context("Cannot read current directory")?,
    };
    std::fs::canonicalize(&dir).with_context(|| format!("Cannot access {}", dir.display()))
}

pub fn open_repo(custom_path: Option<PathBuf>) -> Result<(Repository, PathBuf)> {
    let cwd = working_dir(custom_path)?;
    let repo = Repository::discover(&cwd)
        .with_context(|| "No grits repository found. Run 'grits init' first.")?;
    debug!("Using repository at {}", repo.root().display());
    Ok((repo, cwd))
}

/// User paths are relative to the working directory, not the repository root.
pub fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

pub fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
