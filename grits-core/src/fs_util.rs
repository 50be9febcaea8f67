//! Filesystem helpers shared by the object store, index, HEAD and restore.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Prefix of in-flight temporary files. Anything starting with it is never a
/// finished object.
pub const TEMP_PREFIX: &str = ".tmp-";

/// Writes `data` to `target` so that readers only ever see the old or the new
/// content: the bytes go to a temp file in the same directory, get fsynced,
/// then the temp file is renamed over the target. An existing target keeps
/// its permission bits.
pub fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| Error::InvalidPath(target.display().to_string()))?;
    fs::create_dir_all(parent).map_err(|e| Error::storage_write(parent, e))?;

    let temp_path = parent.join(format!("{}{}", TEMP_PREFIX, uuid::Uuid::new_v4()));

    let write_temp = || -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        if let Ok(existing) = fs::metadata(target) {
            file.set_permissions(existing.permissions())?;
        }
        file.sync_all()
    };

    if let Err(e) = write_temp().and_then(|_| fs::rename(&temp_path, target)) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::storage_write(target, e));
    }

    // Best effort: persist the rename itself.
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }

    Ok(())
}

/// Lexically resolves `.` and `..` without touching the filesystem, so paths
/// that do not exist yet (restore targets) can still be normalized.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Converts `path` into the `/`-separated key used by the index and commits.
/// Relative paths are taken relative to `root`.
pub fn repo_relative(root: &Path, path: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&root.join(path))
    };

    let relative = absolute
        .strip_prefix(root)
        .map_err(|_| Error::InvalidPath(format!("{} is outside repository", path.display())))?;

    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str().to_str().ok_or_else(|| {
                Error::InvalidPath(format!("{} is not valid UTF-8", path.display()))
            })
        })
        .collect::<Result<Vec<&str>>>()?;

    if parts.is_empty() {
        return Err(Error::InvalidPath(format!(
            "{} is the repository root",
            path.display()
        )));
    }

    Ok(parts.join("/"))
}
