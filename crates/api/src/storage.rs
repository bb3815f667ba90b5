//! Avatar storage.
//!
//! [`AvatarStore`] abstracts where uploaded images live. The server ships a
//! [`LocalAvatarStore`] that writes under `STORAGE_DIR`, which the router
//! serves at `/storage`.

use std::path::PathBuf;

use async_trait::async_trait;
use koinonia_core::error::CoreError;
use koinonia_core::storage::{public_url, validate_key};

#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CoreError>;

    /// Remove the object at `key`. Missing objects are not an error.
    async fn delete(&self, key: &str) -> Result<(), CoreError>;

    /// Public URL clients use to fetch `key`.
    fn url_for(&self, key: &str) -> String;

    /// The key behind a URL produced by [`AvatarStore::url_for`], if any.
    fn key_for(&self, url: &str) -> Option<String>;
}

/// Filesystem-backed store rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalAvatarStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalAvatarStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl AvatarStore for LocalAvatarStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CoreError> {
        let path = self.path_for(key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| CoreError::Internal(format!("create {}: {e}", dir.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CoreError::Internal(format!("write {}: {e}", path.display())))?;
        tracing::debug!(key, size = bytes.len(), "Stored object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Internal(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }

    fn url_for(&self, key: &str) -> String {
        public_url(&self.public_base_url, key)
    }

    fn key_for(&self, url: &str) -> Option<String> {
        let prefix = public_url(&self.public_base_url, "");
        url.strip_prefix(&prefix)
            .filter(|key| validate_key(key).is_ok())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalAvatarStore {
        let root = std::env::temp_dir().join(format!("koinonia-storage-{}", uuid::Uuid::new_v4()));
        LocalAvatarStore::new(root, "http://localhost:3000")
    }

    #[tokio::test]
    async fn put_then_delete() {
        let store = temp_store();
        let key = "avatars/1/2-100.png";

        store.put(key, b"png-bytes").await.unwrap();
        let on_disk = tokio::fs::read(store.root().join(key)).await.unwrap();
        assert_eq!(on_disk, b"png-bytes");

        store.delete(key).await.unwrap();
        assert!(!store.root().join(key).exists());
        // Deleting again is fine.
        store.delete(key).await.unwrap();

        let _ = tokio::fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let store = temp_store();
        assert!(store.put("../escape.png", b"x").await.is_err());
    }

    #[test]
    fn urls_map_back_to_keys() {
        let store = temp_store();
        let url = store.url_for("avatars/1/2-100.png");
        assert_eq!(url, "http://localhost:3000/storage/avatars/1/2-100.png");
        assert_eq!(store.key_for(&url).as_deref(), Some("avatars/1/2-100.png"));
        assert_eq!(store.key_for("https://cdn.example.com/a.png"), None);
    }
}
