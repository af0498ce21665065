//! services/api/src/adapters/blob.rs
//!
//! Local-filesystem implementation of the `BlobStore` port used for cover images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use streaming_catalog_core::ports::{BlobStore, PortError, PortResult};
use tracing::debug;

#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves a key below the root. Keys that would escape it are refused.
    fn path_for(&self, key: &str) -> PortResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(PortError::Unexpected(format!("invalid blob key '{key}'")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> PortResult<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unavailable(e.to_string()))?;
        }
        let size = body.len();
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        debug!(key = %key, content_type = %content_type, size, "blob stored");
        Ok(key.to_string())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("catalog-blobs-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn put_writes_and_overwrites() {
        let root = scratch_root();
        let store = LocalBlobStore::new(root.clone());

        let key = store.put("covers/a.jpg", b"first".to_vec(), "image/jpeg").await.unwrap();
        assert_eq!(key, "covers/a.jpg");
        store.put("covers/a.jpg", b"second".to_vec(), "image/jpeg").await.unwrap();

        let stored = tokio::fs::read(root.join("covers/a.jpg")).await.unwrap();
        assert_eq!(stored, b"second");
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_and_tolerates_missing_objects() {
        let root = scratch_root();
        let store = LocalBlobStore::new(root.clone());

        store.put("covers/a.jpg", b"x".to_vec(), "image/jpeg").await.unwrap();
        store.delete("covers/a.jpg").await.unwrap();
        assert!(!root.join("covers/a.jpg").exists());
        store.delete("covers/a.jpg").await.unwrap();
        assert!(store.delete("../evil.jpg").await.is_err());
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_root() {
        let store = LocalBlobStore::new(scratch_root());
        for key in ["../evil.jpg", "/etc/passwd", ""] {
            assert!(store.put(key, b"x".to_vec(), "image/jpeg").await.is_err(), "{key}");
        }
    }
}
