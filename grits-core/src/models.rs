use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Staged or committed files, keyed by repository-relative path.
pub type FileMap = BTreeMap<String, FileEntry>;

/// A snapshot of one path's content reference at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub size: u64,
}

impl FileEntry {
    pub fn new(hash: String, size: u64) -> Self {
        Self {
            hash,
            timestamp: Utc::now(),
            size,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// An immutable snapshot of the staged files plus a link to its parent.
///
/// The `hash` field is not part of the serialized form: it is the SHA-256 of
/// the bytes produced by [`Commit::to_canonical_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Commit {
    #[serde(skip)]
    pub hash: String,
    pub parent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub files: FileMap,
}

impl Commit {
    pub fn new(message: String, files: FileMap) -> Self {
        Self {
            hash: String::new(),
            parent: None,
            timestamp: Utc::now(),
            message,
            files,
        }
    }

    pub fn with_parent(mut self, parent: Option<String>) -> Self {
        self.parent = parent;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Field order is fixed by the struct and `files` is a `BTreeMap`, so
    /// equal commits always serialize to equal bytes.
    pub fn to_canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    /// Parses stored object bytes as a commit. Returns `None` when the bytes
    /// are not a commit (e.g. a blob).
    pub fn from_object(hash: &str, bytes: &[u8]) -> Option<Self> {
        let mut commit: Commit = serde_json::from_slice(bytes).ok()?;
        commit.hash = hash.to_string();
        Some(commit)
    }

    pub fn short_hash(&self) -> &str {
        self.hash.get(..8).unwrap_or(&self.hash)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
