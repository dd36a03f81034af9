//! Blob storage for PinPin.
//!
//! Blobs are addressed by a relative path string and live under a single
//! root directory:
//! ```text
//! {root}/
//! └── files/
//!     └── {user_id}/
//!         └── {uuid}_{name}
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::{PinpinError, Result};

/// Directory-backed blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage path for a new upload of `name` by `user_id`.
    pub fn blob_path(user_id: i64, name: &str) -> String {
        format!("files/{user_id}/{}_{}", Uuid::new_v4(), sanitize_name(name))
    }

    /// Write a blob, replacing any existing content.
    pub fn put(&self, path: &str, content: &[u8]) -> Result<()> {
        let file_path = self.resolve(path)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, content)?;
        Ok(())
    }

    pub fn get(&self, path: &str) -> Result<Vec<u8>> {
        let file_path = self.resolve(path)?;
        match fs::read(&file_path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(PinpinError::NotFound(format!("blob {path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob. Returns false if it did not exist.
    pub fn delete(&self, path: &str) -> Result<bool> {
        let file_path = self.resolve(path)?;
        match fs::remove_file(&file_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Map a blob path to a filesystem path under the root.
    ///
    /// Only plain relative components are accepted.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let plain = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(PinpinError::Validation(format!("invalid blob path: {path}")));
        }
        Ok(self.root.join(relative))
    }
}

/// Reduce a user-supplied file name to characters safe in a path segment.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BlobStore) {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::new(dir.path().join("blobs")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_new_creates_root() {
        let (dir, store) = setup();
        assert!(store.root().exists());
        assert_eq!(store.root(), dir.path().join("blobs"));
    }

    #[test]
    fn test_put_get_delete() {
        let (_dir, store) = setup();
        let path = "files/1/abc_report.pdf";

        store.put(path, b"pdf bytes").unwrap();
        assert!(store.exists(path));
        assert_eq!(store.get(path).unwrap(), b"pdf bytes");

        assert!(store.delete(path).unwrap());
        assert!(!store.exists(path));
        assert!(!store.delete(path).unwrap());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, store) = setup();
        assert!(matches!(
            store.get("files/1/missing"),
            Err(PinpinError::NotFound(_))
        ));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let (_dir, store) = setup();
        for bad in ["", "../etc/passwd", "files/../../x", "/etc/passwd", "./files/x"] {
            assert!(
                matches!(store.put(bad, b"x"), Err(PinpinError::Validation(_))),
                "{bad}"
            );
        }
        assert!(!store.exists("../outside"));
    }

    #[test]
    fn test_blob_path_layout() {
        let path = BlobStore::blob_path(7, "my report (final).pdf");
        assert!(path.starts_with("files/7/"));
        assert!(path.ends_with("_my_report__final_.pdf"));

        let other = BlobStore::blob_path(7, "my report (final).pdf");
        assert_ne!(path, other);
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("notes.txt"), "notes.txt");
        assert_eq!(sanitize_name("../../secret"), "_.._secret");
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name("..."), "file");
        assert_eq!(sanitize_name("résumé.doc"), "résumé.doc");
    }
}
