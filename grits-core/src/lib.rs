//! # grits-core
//!
//! Core library for grits - a small local version control system.
//!
//! Files are snapshotted into a content-addressable object store, staged in
//! an index, linked into a linear commit chain and can be restored from any
//! past snapshot. Everything lives under `.pygrits/` at the repository root.

pub mod diff;
pub mod error;
pub mod fs_util;
pub mod graph;
pub mod head;
pub mod index;
pub mod models;
pub mod repository;
pub mod restore;
pub mod store;

pub use diff::{Diff, DiffLine, DiffLineType, FileDiff, FileStatus};
pub use error::{Error, Result};
pub use graph::{CommitGraph, CommitShow, Log};
pub use head::Head;
pub use index::Index;
pub use models::{Commit, FileEntry, FileMap};
pub use repository::{ChangeKind, Repository, Status, StatusEntry, REPO_DIR};
pub use restore::{HardRestoreReport, RestoreEngine, RestoreFailure, RestoreSource, RestoredFile};
pub use store::ContentStore;
