use crate::error::{Error, Result};
use crate::fs_util;
use crate::graph::{CommitGraph, CommitShow, Log};
use crate::head::Head;
use crate::index::Index;
use crate::models::{Commit, FileEntry, FileMap};
use crate::restore::{HardRestoreReport, RestoreEngine, RestoreSource, RestoredFile};
use crate::store::{self, ContentStore};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Name of the metadata directory at the repository root.
pub const REPO_DIR: &str = ".pygrits";

/// The state of one path in `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeKind::Added => "new file",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    /// Index versus HEAD.
    pub staged: Vec<StatusEntry>,
    /// Working tree versus index.
    pub unstaged: Vec<StatusEntry>,
}

impl Status {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }
}

/// An open repository: the root directory plus handles on everything under
/// `.pygrits`. Every operation goes through this value, so several
/// repositories can be used side by side.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    store: ContentStore,
    index: Index,
    head: Head,
    graph: CommitGraph,
}

impl Repository {
    fn at(root: PathBuf) -> Self {
        let meta = root.join(REPO_DIR);
        let store = ContentStore::new(meta.join("objects"));
        let index = Index::new(meta.join("index"));
        let head = Head::new(meta.join("HEAD"));
        let graph = CommitGraph::new(store.clone(), head.clone());
        Self {
            root,
            store,
            index,
            head,
            graph,
        }
    }

    fn canonical_root(path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).map_err(|_| Error::PathNotFound(path.to_path_buf()))
    }

    fn is_repository(root: &Path) -> bool {
        let meta = root.join(REPO_DIR);
        meta.join("objects").is_dir() && meta.join("HEAD").is_file()
    }

    /// Creates `.pygrits` with an empty object store, a null HEAD and an
    /// empty index.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|e| Error::storage_write(path, e))?;
        let root = Self::canonical_root(path)?;

        if Self::is_repository(&root) {
            return Err(Error::AlreadyInitialized(root));
        }

        let repo = Self::at(root);
        let objects = repo.store.objects_dir();
        fs::create_dir_all(objects).map_err(|e| Error::storage_write(objects, e))?;
        repo.head.reset()?;
        repo.index.clear()?;

        info!("Initialized empty repository in {}", repo.meta_dir().display());
        Ok(repo)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = Self::canonical_root(path.as_ref())?;
        if !Self::is_repository(&root) {
            return Err(Error::NotARepository(root));
        }
        debug!("Opened repository at {}", root.display());
        Ok(Self::at(root))
    }

    /// Opens the nearest repository at or above `start`.
    pub fn discover<P: AsRef<Path>>(start: P) -> Result<Self> {
        let start = Self::canonical_root(start.as_ref())?;
        start
            .ancestors()
            .find(|dir| Self::is_repository(dir))
            .map(|dir| Self::at(dir.to_path_buf()))
            .ok_or_else(|| Error::NotARepository(start.clone()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(REPO_DIR)
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn graph(&self) -> &CommitGraph {
        &self.graph
    }

    pub fn restorer(&self) -> RestoreEngine {
        RestoreEngine::new(
            self.root.clone(),
            self.store.clone(),
            self.index.clone(),
            self.graph.clone(),
        )
    }

    /// Converts a user path (absolute, or relative to the root) into an index
    /// key.
    pub fn relative_path<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        fs_util::repo_relative(&self.root, path.as_ref())
    }

    /// Stages a file, or every file below a directory. Returns the staged
    /// keys in order.
    pub fn add<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let path = path.as_ref();
        let full = fs_util::normalize(&self.root.join(path));

        if !full.starts_with(&self.root) {
            return Err(Error::InvalidPath(format!(
                "{} is outside repository",
                path.display()
            )));
        }
        if full.starts_with(self.meta_dir()) {
            return Err(Error::InvalidPath(format!(
                "{} is inside {}",
                path.display(),
                REPO_DIR
            )));
        }
        if !full.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }

        let mut files = Vec::new();
        if full.is_dir() {
            let walker = WalkDir::new(&full)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.file_name() != REPO_DIR);
            for entry in walker {
                let entry = entry.map_err(|e| Error::Io(e.into()))?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(full);
        }

        // Keys are checked for every file before anything is written.
        let keys = files
            .iter()
            .map(|file| self.relative_path(file))
            .collect::<Result<Vec<String>>>()?;

        let now = Utc::now();
        let mut staged = FileMap::new();
        for (key, file) in keys.iter().zip(&files) {
            let content = fs::read(file)?;
            let hash = self.store.store(&content)?;
            info!("Added {} ({})", key, hash.get(..8).unwrap_or(&hash));
            staged.insert(
                key.clone(),
                FileEntry::new(hash, content.len() as u64).with_timestamp(now),
            );
        }
        self.index.stage_all(staged)?;

        Ok(keys)
    }

    pub fn head(&self) -> Result<Option<Commit>> {
        self.graph.head()
    }

    pub fn head_hash(&self) -> Result<Option<String>> {
        self.head.read()
    }

    pub fn commit(&self, message: &str) -> Result<Commit> {
        self.graph.commit(&self.index, message)
    }

    pub fn resolve(&self, reference: &str) -> Result<Commit> {
        self.graph.resolve(reference)
    }

    pub fn log(&self) -> Result<Log<'_>> {
        self.graph.log()
    }

    pub fn show(&self, reference: &str) -> Result<CommitShow> {
        self.graph.show(reference)
    }

    pub fn restore<P: AsRef<Path>>(
        &self,
        path: P,
        source: &RestoreSource,
        restage: bool,
    ) -> Result<RestoredFile> {
        let key = self.relative_path(path)?;
        self.restorer().restore(&key, source, restage)
    }

    pub fn restore_hard(&self) -> Result<HardRestoreReport> {
        self.restorer().restore_hard()
    }

    pub fn status(&self) -> Result<Status> {
        let staged_files = self.index.load()?;
        let head_files = self
            .graph
            .head()?
            .map(|c| c.files)
            .unwrap_or_default();

        let mut status = Status {
            staged: compare(&head_files, &staged_files),
            unstaged: Vec::new(),
        };

        for (path, entry) in &staged_files {
            if let Some(kind) = self.worktree_change(path, entry)? {
                status.unstaged.push(StatusEntry {
                    path: path.clone(),
                    kind,
                });
            }
        }

        Ok(status)
    }

    fn worktree_change(&self, path: &str, entry: &FileEntry) -> Result<Option<ChangeKind>> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Ok(Some(ChangeKind::Deleted));
        }
        let metadata = fs::metadata(&full)?;
        if metadata.len() != entry.size {
            return Ok(Some(ChangeKind::Modified));
        }
        let content = fs::read(&full)?;
        Ok((store::hash_bytes(&content) != entry.hash).then_some(ChangeKind::Modified))
    }
}

fn compare(old: &FileMap, new: &FileMap) -> Vec<StatusEntry> {
    let mut changes = Vec::new();
    for (path, entry) in new {
        let kind = match old.get(path) {
            None => Some(ChangeKind::Added),
            Some(previous) if previous.hash != entry.hash => Some(ChangeKind::Modified),
            Some(_) => None,
        };
        if let Some(kind) = kind {
            changes.push(StatusEntry {
                path: path.clone(),
                kind,
            });
        }
    }
    for path in old.keys().filter(|p| !new.contains_key(*p)) {
        changes.push(StatusEntry {
            path: path.clone(),
            kind: ChangeKind::Deleted,
        });
    }
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}
