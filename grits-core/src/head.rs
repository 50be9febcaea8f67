use crate::error::Result;
use crate::fs_util;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The `.pygrits/HEAD` pointer: the current commit hash, or empty.
#[derive(Debug, Clone)]
pub struct Head {
    path: PathBuf,
}

impl Head {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let hash = content.trim();
                Ok((!hash.is_empty()).then(|| hash.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(&self, hash: &str) -> Result<()> {
        fs_util::atomic_write(&self.path, hash.as_bytes())
    }

    pub fn reset(&self) -> Result<()> {
        fs_util::atomic_write(&self.path, b"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_head_lifecycle() {
        let dir = TempDir::new().unwrap();
        let head = Head::new(dir.path().join("HEAD"));

        assert_eq!(head.read().unwrap(), None);

        head.reset().unwrap();
        assert_eq!(head.read().unwrap(), None);

        head.set("abc123").unwrap();
        assert_eq!(head.read().unwrap(), Some("abc123".to_string()));
    }

    #[test]
    fn test_head_tolerates_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("HEAD");
        fs::write(&path, "abc123\n").unwrap();

        assert_eq!(Head::new(&path).read().unwrap(), Some("abc123".to_string()));
    }

    #[test]
    fn test_set_failure_is_storage_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("HEAD");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("child"), b"x").unwrap();

        let err = Head::new(&path).set("abc123").unwrap_err();

        assert!(matches!(err, crate::Error::StorageWrite { .. }));
        assert!(path.is_dir());
    }
}
