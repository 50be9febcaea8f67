use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not a grits repository (or any parent directory): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Repository already initialized at: {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Ambiguous hash prefix '{prefix}' matches {} objects", .matches.len())]
    AmbiguousHash {
        prefix: String,
        matches: Vec<String>,
    },

    #[error("Invalid commit {hash}: {reason}")]
    InvalidCommit { hash: String, reason: String },

    #[error("Path not tracked in {source_name}: {path}")]
    PathNotTracked { path: String, source_name: String },

    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Nothing to commit: no files staged")]
    NothingToCommit,

    #[error("Commit message cannot be empty")]
    EmptyMessage,

    #[error("Nothing to restore: no commits yet")]
    NothingToRestore,

    #[error("Failed to write {}: {source}", .path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn storage_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::StorageWrite {
            path: path.into(),
            source,
        }
    }
}
