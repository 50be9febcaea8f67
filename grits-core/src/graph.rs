use crate::diff::FileDiff;
use crate::error::{Error, Result};
use crate::head::Head;
use crate::index::Index;
use crate::models::{Commit, FileMap};
use crate::store::ContentStore;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Symbolic name accepted by [`CommitGraph::resolve`] for the current commit.
pub const HEAD_REF: &str = "HEAD";

/// A commit together with the per-file changes it introduced over its parent.
#[derive(Debug, Clone)]
pub struct CommitShow {
    pub commit: Commit,
    pub files: Vec<FileDiff>,
}

impl CommitShow {
    /// Files whose content differs from the parent.
    pub fn changed_files(&self) -> impl Iterator<Item = &FileDiff> {
        self.files
            .iter()
            .filter(|f| f.status != crate::diff::FileStatus::Unchanged)
    }
}

/// The linear chain of commits stored in the object store, plus HEAD.
#[derive(Debug, Clone)]
pub struct CommitGraph {
    store: ContentStore,
    head: Head,
}

impl CommitGraph {
    pub fn new(store: ContentStore, head: Head) -> Self {
        Self { store, head }
    }

    pub fn commit(&self, index: &Index, message: &str) -> Result<Commit> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let files = index.load()?;
        if files.is_empty() {
            return Err(Error::NothingToCommit);
        }

        let parent = match self.head()? {
            Some(head) if same_content(&head.files, &files) => return Err(Error::NothingToCommit),
            Some(head) => Some(head.hash),
            None => None,
        };

        let commit = Commit::new(message.to_string(), files).with_parent(parent);
        let commit = self.write_commit(commit)?;

        info!(
            "Created commit {} ({} files)",
            commit.short_hash(),
            commit.files.len()
        );
        Ok(commit)
    }

    /// Stores `commit` and advances HEAD to it. The returned commit carries
    /// its hash.
    pub fn write_commit(&self, mut commit: Commit) -> Result<Commit> {
        let bytes = commit.to_canonical_bytes()?;
        commit.hash = self.store.store(&bytes)?;
        self.head.set(&commit.hash)?;
        debug!("HEAD -> {}", commit.hash);
        Ok(commit)
    }

    pub fn head(&self) -> Result<Option<Commit>> {
        match self.head.read()? {
            Some(hash) => self.load_commit(&hash).map(Some),
            None => Ok(None),
        }
    }

    /// Resolves `HEAD`, a full hash or a unique hash prefix to a commit.
    pub fn resolve(&self, reference: &str) -> Result<Commit> {
        let reference = reference.trim();
        if reference == HEAD_REF {
            return self
                .head()?
                .ok_or_else(|| Error::ObjectNotFound(HEAD_REF.to_string()));
        }

        let hash = self.store.resolve_prefix(reference)?;
        self.load_commit(&hash)
    }

    pub fn load_commit(&self, hash: &str) -> Result<Commit> {
        let bytes = self.store.load(hash)?;
        Commit::from_object(hash, &bytes).ok_or_else(|| Error::InvalidCommit {
            hash: hash.to_string(),
            reason: "object is not a commit".to_string(),
        })
    }

    /// Walks from HEAD to the root commit. Each call starts a fresh walk.
    pub fn log(&self) -> Result<Log<'_>> {
        Ok(Log {
            graph: self,
            next: self.head.read()?,
        })
    }

    pub fn show(&self, reference: &str) -> Result<CommitShow> {
        let commit = self.resolve(reference)?;
        let parent_files = match &commit.parent {
            Some(parent) => self.load_commit(parent)?.files,
            None => FileMap::new(),
        };

        let paths: BTreeSet<&String> = parent_files.keys().chain(commit.files.keys()).collect();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let old = self.blob_for(&parent_files, path)?;
            let new = self.blob_for(&commit.files, path)?;
            files.push(FileDiff::between(path, old.as_deref(), new.as_deref()));
        }

        Ok(CommitShow { commit, files })
    }

    fn blob_for(&self, files: &FileMap, path: &str) -> Result<Option<Vec<u8>>> {
        files
            .get(path)
            .map(|entry| self.store.load(&entry.hash))
            .transpose()
    }
}

/// Same paths pointing at the same blobs. Staging timestamps are ignored so
/// re-adding an unchanged file does not count as a change.
fn same_content(a: &FileMap, b: &FileMap) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|((pa, ea), (pb, eb))| pa == pb && ea.hash == eb.hash)
}

/// Lazy iterator over the commit chain, newest first.
///
/// A broken link (missing or malformed parent) is yielded as an error and
/// ends the walk.
pub struct Log<'a> {
    graph: &'a CommitGraph,
    next: Option<String>,
}

impl Iterator for Log<'_> {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.next.take()?;
        match self.graph.load_commit(&hash) {
            Ok(commit) => {
                self.next = commit.parent.clone();
                Some(Ok(commit))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffLineType, FileStatus};
    use chrono::Utc;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: ContentStore,
        index: Index,
        graph: CommitGraph,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path().join("objects"));
        let head = Head::new(dir.path().join("HEAD"));
        let index = Index::new(dir.path().join("index"));
        let graph = CommitGraph::new(store.clone(), head);
        Fixture {
            _dir: dir,
            store,
            index,
            graph,
        }
    }

    impl Fixture {
        fn stage(&self, path: &str, content: &[u8]) -> String {
            let hash = self.store.store(content).unwrap();
            self.index
                .stage(path, &hash, content.len() as u64, Utc::now())
                .unwrap();
            hash
        }
    }

    #[test]
    fn test_commit_requires_staged_files() {
        let fx = fixture();
        assert!(matches!(
            fx.graph.commit(&fx.index, "empty"),
            Err(Error::NothingToCommit)
        ));
        assert!(fx.graph.head().unwrap().is_none());
    }

    #[test]
    fn test_commit_unchanged_index_is_refused() {
        let fx = fixture();
        fx.stage("a.txt", b"a");
        let first = fx.graph.commit(&fx.index, "first").unwrap();

        assert!(matches!(
            fx.graph.commit(&fx.index, "nothing changed"),
            Err(Error::NothingToCommit)
        ));
        assert_eq!(fx.graph.head().unwrap().unwrap().hash, first.hash);
        assert_eq!(fx.graph.log().unwrap().count(), 1);

        // Restaging the same content is still no change.
        fx.stage("a.txt", b"a");
        assert!(matches!(
            fx.graph.commit(&fx.index, "same bytes"),
            Err(Error::NothingToCommit)
        ));

        fx.stage("a.txt", b"b");
        let second = fx.graph.commit(&fx.index, "second").unwrap();
        assert_eq!(second.parent.as_deref(), Some(first.hash.as_str()));
    }

    #[test]
    fn test_commit_requires_message() {
        let fx = fixture();
        fx.stage("a.txt", b"a");
        assert!(matches!(
            fx.graph.commit(&fx.index, "   \n"),
            Err(Error::EmptyMessage)
        ));
    }

    #[test]
    fn test_commit_hash_matches_stored_bytes() {
        let fx = fixture();
        fx.stage("a.txt", b"a");

        let commit = fx.graph.commit(&fx.index, "  first  ").unwrap();

        assert_eq!(commit.message, "first");
        assert!(commit.is_root());
        let stored = fx.store.load(&commit.hash).unwrap();
        assert_eq!(crate::store::hash_bytes(&stored), commit.hash);
        assert_eq!(fx.graph.head().unwrap().unwrap(), commit);
    }

    #[test]
    fn test_identical_commits_share_hash() {
        let fx = fixture();
        fx.stage("a.txt", b"a");
        let files = fx.index.load().unwrap();
        let ts = Utc::now();

        let one = fx
            .graph
            .write_commit(Commit::new("same".to_string(), files.clone()).with_timestamp(ts))
            .unwrap();
        let two = fx
            .graph
            .write_commit(Commit::new("same".to_string(), files).with_timestamp(ts))
            .unwrap();

        assert_eq!(one.hash, two.hash);
    }

    #[test]
    fn test_log_follows_parents() {
        let fx = fixture();
        let mut hashes = Vec::new();
        for i in 0..5 {
            fx.stage("file.txt", format!("version {}", i).as_bytes());
            hashes.push(fx.graph.commit(&fx.index, &format!("commit {}", i)).unwrap().hash);
        }

        let log: Vec<Commit> = fx.graph.log().unwrap().collect::<Result<_>>().unwrap();

        assert_eq!(log.len(), 5);
        hashes.reverse();
        assert_eq!(log.iter().map(|c| c.hash.clone()).collect::<Vec<_>>(), hashes);
        for pair in log.windows(2) {
            assert_eq!(pair[0].parent.as_deref(), Some(pair[1].hash.as_str()));
        }
        assert!(log.last().unwrap().is_root());

        // A second walk starts again from HEAD.
        assert_eq!(fx.graph.log().unwrap().count(), 5);
    }

    #[test]
    fn test_log_empty_without_commits() {
        let fx = fixture();
        assert_eq!(fx.graph.log().unwrap().count(), 0);
    }

    #[test]
    fn test_resolve() {
        let fx = fixture();
        fx.stage("a.txt", b"a");
        let commit = fx.graph.commit(&fx.index, "first").unwrap();

        assert_eq!(fx.graph.resolve(&commit.hash[..10]).unwrap().hash, commit.hash);
        assert_eq!(fx.graph.resolve("HEAD").unwrap().hash, commit.hash);

        let blob = fx.store.store(b"not a commit").unwrap();
        assert!(matches!(
            fx.graph.resolve(&blob),
            Err(Error::InvalidCommit { .. })
        ));
        assert!(matches!(
            fx.graph.resolve(&"f".repeat(64)),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_head_without_commits() {
        let fx = fixture();
        assert!(matches!(
            fx.graph.resolve("HEAD"),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_show_against_parent() {
        let fx = fixture();
        fx.stage("keep.txt", b"same\n");
        fx.stage("gone.txt", b"bye\n");
        fx.stage("file.txt", b"hello");
        fx.graph.commit(&fx.index, "first").unwrap();

        fx.index.unstage("gone.txt").unwrap();
        fx.stage("file.txt", b"hello world");
        fx.stage("new.txt", b"one\ntwo\n");
        let second = fx.graph.commit(&fx.index, "second").unwrap();

        let show = fx.graph.show(&second.hash).unwrap();
        let status: Vec<(&str, FileStatus)> = show
            .files
            .iter()
            .map(|f| (f.path.as_str(), f.status))
            .collect();

        assert_eq!(
            status,
            vec![
                ("file.txt", FileStatus::Modified),
                ("gone.txt", FileStatus::Deleted),
                ("keep.txt", FileStatus::Unchanged),
                ("new.txt", FileStatus::Added),
            ]
        );
        assert_eq!(show.changed_files().count(), 3);

        let file = &show.files[0];
        let lines = file.diff.lines();
        assert_eq!(lines[0].line_type, DiffLineType::Deletion);
        assert_eq!(lines[0].text(), "hello");
        assert_eq!(lines[1].line_type, DiffLineType::Addition);
        assert_eq!(lines[1].text(), "hello world");
    }

    #[test]
    fn test_show_root_commit_adds_everything() {
        let fx = fixture();
        fx.stage("a.txt", b"1\n2\n");
        let commit = fx.graph.commit(&fx.index, "root").unwrap();

        let show = fx.graph.show(&commit.hash).unwrap();

        assert_eq!(show.files.len(), 1);
        assert_eq!(show.files[0].status, FileStatus::Added);
        assert_eq!(show.files[0].diff.additions(), 2);
    }
}
