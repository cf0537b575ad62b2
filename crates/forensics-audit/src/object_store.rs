//! Content-addressable blob storage capability (spec §"Out of scope": raw
//! object storage transport). Grounded on kumomta's `spool` crate: atomic
//! write-then-rename via a temp file in a sibling directory, plain
//! `tokio::fs` reads.

use crate::errors::ObjectStoreError;
use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
    async fn exists(&self, key: &str) -> bool;
}

/// Stores each key at `{base_dir}/{key}`, creating parent directories as
/// needed. `key` may contain `/` (e.g. `eml/{id}`, `exports/{id}`).
pub struct LocalDiskObjectStore {
    base_dir: PathBuf,
}

impl LocalDiskObjectStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalDiskObjectStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), ObjectStoreError> {
        let path = self.resolve(key);
        let dir = path.parent().unwrap().to_path_buf();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || -> Result<(), ObjectStoreError> {
            std::fs::create_dir_all(&dir)?;
            let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
            std::io::Write::write_all(&mut temp, &data)?;
            temp.persist(&path).map_err(|err| err.error)?;
            Ok(())
        })
        .await
        .expect("object store put task panicked")
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.resolve(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ObjectStoreError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.resolve(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, key: &str) -> bool {
        tokio::fs::try_exists(self.resolve(key)).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskObjectStore::new(dir.path());
        store.put("eml/abc", b"hello world").await.unwrap();
        let data = store.get("eml/abc").await.unwrap();
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskObjectStore::new(dir.path());
        let err = store.get("eml/missing").await.unwrap_err();
        assert!(matches!(err, ObjectStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskObjectStore::new(dir.path());
        store.put("eml/abc", b"data").await.unwrap();
        store.delete("eml/abc").await.unwrap();
        assert!(!store.exists("eml/abc").await);
        store.delete("eml/abc").await.unwrap();
    }
}
