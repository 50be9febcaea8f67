use crate::error::{Error, Result};
use crate::fs_util::{self, TEMP_PREFIX};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Length of a full object hash in hex characters.
pub const HASH_LEN: usize = 64;

/// SHA-256 of `bytes` as lowercase hex. Used for blobs and commits alike.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_object_name(name: &str) -> bool {
    name.len() == HASH_LEN && is_hex(name)
}

/// Immutable, deduplicated object storage: one file per object under
/// `objects/<hash>`.
#[derive(Debug, Clone)]
pub struct ContentStore {
    objects_dir: PathBuf,
}

impl ContentStore {
    pub fn new<P: AsRef<Path>>(objects_dir: P) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    fn object_path(&self, hash: &str) -> Option<PathBuf> {
        is_object_name(hash).then(|| self.objects_dir.join(hash))
    }

    pub fn store(&self, bytes: &[u8]) -> Result<String> {
        let hash = hash_bytes(bytes);
        let path = self.objects_dir.join(&hash);

        if path.exists() {
            debug!("Object {} already stored", &hash[..8]);
            return Ok(hash);
        }

        fs_util::atomic_write(&path, bytes)?;
        debug!("Stored object {} ({} bytes)", &hash[..8], bytes.len());
        Ok(hash)
    }

    pub fn load(&self, hash: &str) -> Result<Vec<u8>> {
        let path = self
            .object_path(hash)
            .ok_or_else(|| Error::ObjectNotFound(hash.to_string()))?;

        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ObjectNotFound(hash.to_string()),
            _ => Error::Io(e),
        })
    }

    pub fn exists(&self, hash: &str) -> bool {
        self.object_path(hash).is_some_and(|path| path.is_file())
    }

    /// Every stored object hash, sorted. In-flight temp files are skipped.
    pub fn hashes(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.objects_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut hashes = Vec::new();
        for entry in entries {
            let Ok(name) = entry?.file_name().into_string() else {
                continue;
            };
            if !name.starts_with(TEMP_PREFIX) && is_object_name(&name) {
                hashes.push(name);
            }
        }
        hashes.sort();
        Ok(hashes)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.hashes()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn resolve_prefix(&self, prefix: &str) -> Result<String> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.is_empty() || prefix.len() > HASH_LEN || !is_hex(&prefix) {
            return Err(Error::ObjectNotFound(prefix));
        }

        let mut matches: Vec<String> = self
            .hashes()?
            .into_iter()
            .filter(|hash| hash.starts_with(&prefix))
            .collect();

        match matches.len() {
            0 => Err(Error::ObjectNotFound(prefix)),
            1 => Ok(matches.remove(0)),
            _ => Err(Error::AmbiguousHash { prefix, matches }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, ContentStore) {
        let dir = TempDir::new().unwrap();
        let store = ContentStore::new(dir.path().join("objects"));
        (dir, store)
    }

    #[test]
    fn test_hash_is_sha256() {
        assert_eq!(
            hash_bytes(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_store_and_load() {
        let (_dir, store) = temp_store();

        let hash = store.store(b"Hello, World!").unwrap();

        assert_eq!(hash.len(), HASH_LEN);
        assert!(store.exists(&hash));
        assert_eq!(store.load(&hash).unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_store_deduplicates() {
        let (_dir, store) = temp_store();

        let first = store.store(b"same bytes").unwrap();
        let second = store.store(b"same bytes").unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_empty_content() {
        let (_dir, store) = temp_store();

        let hash = store.store(b"").unwrap();

        assert_eq!(store.load(&hash).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_load_missing() {
        let (_dir, store) = temp_store();

        let missing = "0".repeat(HASH_LEN);
        assert!(!store.exists(&missing));
        assert!(matches!(store.load(&missing), Err(Error::ObjectNotFound(_))));
        assert!(matches!(store.load("../escape"), Err(Error::ObjectNotFound(_))));
    }

    #[test]
    fn test_resolve_prefix() {
        let (_dir, store) = temp_store();
        let hash = store.store(b"hello").unwrap();

        assert_eq!(store.resolve_prefix(&hash[..6]).unwrap(), hash);
        assert_eq!(store.resolve_prefix(&hash).unwrap(), hash);
        assert_eq!(store.resolve_prefix(&hash[..6].to_uppercase()).unwrap(), hash);
        assert!(matches!(
            store.resolve_prefix("ffffffff"),
            Err(Error::ObjectNotFound(_))
        ));
        assert!(matches!(store.resolve_prefix(""), Err(Error::ObjectNotFound(_))));
        assert!(matches!(
            store.resolve_prefix("not-hex"),
            Err(Error::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_prefix_ambiguous() {
        let (_dir, store) = temp_store();
        let mut hashes = Vec::new();
        // 17 distinct objects guarantee two share a first hex digit.
        for i in 0..17 {
            hashes.push(store.store(format!("object {}", i).as_bytes()).unwrap());
        }
        let shared = hashes
            .iter()
            .map(|h| &h[..1])
            .find(|p| hashes.iter().filter(|h| h.starts_with(*p)).count() > 1)
            .unwrap()
            .to_string();

        match store.resolve_prefix(&shared) {
            Err(Error::AmbiguousHash { prefix, matches }) => {
                assert_eq!(prefix, shared);
                assert!(matches.len() > 1);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_hashes_ignore_temp_files() {
        let (_dir, store) = temp_store();
        store.store(b"real").unwrap();
        fs::write(store.objects_dir().join(".tmp-leftover"), b"partial").unwrap();

        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_failed_store_writes_nothing() {
        let (_dir, store) = temp_store();
        fs::write(store.objects_dir(), b"not a directory").unwrap();

        let err = store.store(b"payload").unwrap_err();

        assert!(matches!(err, Error::StorageWrite { .. }));
        assert!(!store.exists(&hash_bytes(b"payload")));
        assert_eq!(fs::read(store.objects_dir()).unwrap(), b"not a directory");

        fs::remove_file(store.objects_dir()).unwrap();
        assert!(store.is_empty().unwrap());
    }
}
