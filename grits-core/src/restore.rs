use crate::diff::{self, Diff};
use crate::error::{Error, Result};
use crate::fs_util;
use crate::graph::CommitGraph;
use crate::index::Index;
use crate::models::FileEntry;
use crate::store::ContentStore;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a single-path restore takes its content from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RestoreSource {
    /// The staged entry in the index.
    #[default]
    Staged,
    /// A commit reference: `HEAD`, a full hash or a unique prefix.
    Commit(String),
}

impl RestoreSource {
    fn name(&self) -> String {
        match self {
            RestoreSource::Staged => "index".to_string(),
            RestoreSource::Commit(reference) => format!("commit {}", reference),
        }
    }
}

/// What one restored path looked like before and after.
#[derive(Debug, Clone)]
pub struct RestoredFile {
    pub path: String,
    pub entry: FileEntry,
    /// Working-tree content before the restore versus the restored content.
    pub changes: Diff,
    /// The file did not exist in the working tree before the restore.
    pub created: bool,
}

#[derive(Debug)]
pub struct RestoreFailure {
    pub path: String,
    pub error: Error,
}

#[derive(Debug)]
pub struct HardRestoreReport {
    pub commit: String,
    pub restored: Vec<RestoredFile>,
    pub failed: Vec<RestoreFailure>,
}

impl HardRestoreReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Writes stored snapshots back into the working tree.
#[derive(Debug, Clone)]
pub struct RestoreEngine {
    root: PathBuf,
    store: ContentStore,
    index: Index,
    graph: CommitGraph,
}

impl RestoreEngine {
    pub fn new(root: PathBuf, store: ContentStore, index: Index, graph: CommitGraph) -> Self {
        Self {
            root,
            store,
            index,
            graph,
        }
    }

    /// Restores `path` (a repository-relative key) from `source`. With
    /// `restage`, a commit source also overwrites the path's index entry.
    pub fn restore(&self, path: &str, source: &RestoreSource, restage: bool) -> Result<RestoredFile> {
        let entry = match source {
            RestoreSource::Staged => self.index.get(path)?,
            RestoreSource::Commit(reference) => {
                self.graph.resolve(reference)?.files.get(path).cloned()
            }
        }
        .ok_or_else(|| Error::PathNotTracked {
            path: path.to_string(),
            source_name: source.name(),
        })?;

        let restored = self.write_entry(path, &entry)?;

        if restage && matches!(source, RestoreSource::Commit(_)) {
            self.index
                .stage(path, &entry.hash, entry.size, entry.timestamp)?;
        }

        info!("Restored {} from {}", path, source.name());
        Ok(restored)
    }

    /// Applies the whole HEAD snapshot. Each path is restored independently;
    /// failures are collected rather than rolled back. The index is reset to
    /// HEAD's file map in either case.
    pub fn restore_hard(&self) -> Result<HardRestoreReport> {
        let head = self.graph.head()?.ok_or(Error::NothingToRestore)?;

        let mut restored = Vec::new();
        let mut failed = Vec::new();
        for (path, entry) in &head.files {
            match self.write_entry(path, entry) {
                Ok(file) => restored.push(file),
                Err(error) => {
                    warn!("Failed to restore {}: {}", path, error);
                    failed.push(RestoreFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        self.index.save(&head.files)?;

        info!(
            "Hard restore to {}: {} restored, {} failed",
            head.short_hash(),
            restored.len(),
            failed.len()
        );
        Ok(HardRestoreReport {
            commit: head.hash,
            restored,
            failed,
        })
    }

    fn write_entry(&self, path: &str, entry: &FileEntry) -> Result<RestoredFile> {
        let content = self.store.load(&entry.hash)?;
        let target = self.worktree_path(path)?;

        let previous = match fs::read(&target) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        if previous.as_deref() != Some(content.as_slice()) {
            fs_util::atomic_write(&target, &content)?;
        }
        debug!("Wrote {} ({} bytes)", target.display(), content.len());

        Ok(RestoredFile {
            path: path.to_string(),
            entry: entry.clone(),
            changes: diff::diff(previous.as_deref().unwrap_or_default(), &content),
            created: previous.is_none(),
        })
    }

    /// Maps an index key back to a filesystem path, refusing keys that would
    /// land outside the working tree.
    fn worktree_path(&self, path: &str) -> Result<PathBuf> {
        let target = fs_util::normalize(&self.root.join(Path::new(path)));
        if !target.starts_with(&self.root) || target == self.root {
            return Err(Error::InvalidPath(path.to_string()));
        }
        Ok(target)
    }
}
