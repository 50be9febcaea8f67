use crate::error::{Error, Result};
use crate::fs_util;
use crate::models::{FileEntry, FileMap};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const INDEX_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    #[serde(default)]
    entries: FileMap,
}

/// The staging area, persisted as JSON at `.pygrits/index`.
///
/// Every mutation reads the current file, applies the change and writes the
/// whole mapping back atomically.
#[derive(Debug, Clone)]
pub struct Index {
    path: PathBuf,
}

impl Index {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing index file is a fresh repository, not an error.
    pub fn load(&self) -> Result<FileMap> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(FileMap::new());
        }

        let file: IndexFile = serde_json::from_slice(&content)?;
        Ok(file.entries)
    }

    pub fn save(&self, entries: &FileMap) -> Result<()> {
        let file = IndexFile {
            version: INDEX_VERSION,
            entries: entries.clone(),
        };
        let content = serde_json::to_vec_pretty(&file)?;
        fs_util::atomic_write(&self.path, &content)?;
        debug!("Wrote index with {} entries", entries.len());
        Ok(())
    }

    pub fn stage(&self, path: &str, hash: &str, size: u64, timestamp: DateTime<Utc>) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(
            path.to_string(),
            FileEntry::new(hash.to_string(), size).with_timestamp(timestamp),
        );
        self.save(&entries)?;
        debug!("Staged {} ({})", path, hash.get(..8).unwrap_or(hash));
        Ok(())
    }

    /// Merges `staged` into the index with a single load and save, so either
    /// every entry lands or none does.
    pub fn stage_all(&self, staged: FileMap) -> Result<()> {
        if staged.is_empty() {
            return Ok(());
        }
        let mut entries = self.load()?;
        let count = staged.len();
        entries.extend(staged);
        self.save(&entries)?;
        debug!("Staged {} files", count);
        Ok(())
    }

    pub fn unstage(&self, path: &str) -> Result<FileEntry> {
        let mut entries = self.load()?;
        let removed = entries.remove(path).ok_or_else(|| Error::PathNotTracked {
            path: path.to_string(),
            source_name: "index".to_string(),
        })?;
        self.save(&entries)?;
        debug!("Unstaged {}", path);
        Ok(removed)
    }

    pub fn get(&self, path: &str) -> Result<Option<FileEntry>> {
        Ok(self.load()?.remove(path))
    }

    pub fn clear(&self) -> Result<()> {
        self.save(&FileMap::new())
    }
}
