//! `Store`/`Verify`/`Presign`/`Download` orchestration (spec §4.11), built
//! on the `ObjectStore` and `Catalog` capabilities.

use crate::catalog::Catalog;
use crate::object_store::ObjectStore;
use crate::tokens;
use chrono::{Duration, Utc};
use forensics_types::audit::{
    EmlRecord, ListFilters, ListResult, PresignResult, StoreMetadata, StoreResult, VerifyResult,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

const RECORD_TTL_DAYS: i64 = 90;

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn new_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Owns the two storage capabilities and the secret used for presign
/// tokens; the thing the HTTP layer actually calls into.
pub struct AuditStore {
    object_store: Arc<dyn ObjectStore>,
    catalog: Arc<dyn Catalog>,
    hmac_secret: Vec<u8>,
    origin: String,
}

impl AuditStore {
    pub fn new(object_store: Arc<dyn ObjectStore>, catalog: Arc<dyn Catalog>, hmac_secret: Vec<u8>, origin: String) -> Self {
        Self {
            object_store,
            catalog,
            hmac_secret,
            origin,
        }
    }

    pub async fn store(&self, raw_bytes: &[u8], metadata: StoreMetadata) -> anyhow::Result<StoreResult> {
        let hash = sha256_hex(raw_bytes);
        let id = new_id();
        let stored_at = Utc::now();
        let expires_at = stored_at + Duration::days(RECORD_TTL_DAYS);

        self.object_store.put(&format!("eml/{id}"), raw_bytes).await?;

        let metadata_json = serde_json::to_value(&metadata.extra)?;
        self.catalog
            .insert(&EmlRecord {
                id: id.clone(),
                hash_sha256: hash.clone(),
                from_domain: metadata.from_domain,
                subject_preview: metadata.subject_preview,
                stored_at,
                expires_at,
                metadata: metadata_json,
            })
            .await?;

        tracing::debug!(id = %id, "stored eml record");

        Ok(StoreResult {
            id,
            hash,
            stored_at,
        })
    }

    pub async fn list(&self, filters: &ListFilters) -> Result<ListResult, crate::errors::CatalogError> {
        self.catalog.list(filters).await
    }

    /// Raw bytes for an already-authorized caller (the admin download
    /// route); unlike `download` this performs no token check.
    pub async fn fetch(&self, id: &str) -> anyhow::Result<Vec<u8>> {
        Ok(self.object_store.get(&format!("eml/{id}")).await?)
    }

    /// Deletes both halves of the record (object bytes and catalog row),
    /// per the ownership note that deletion must cascade both.
    pub async fn delete(&self, id: &str) -> anyhow::Result<()> {
        self.object_store.delete(&format!("eml/{id}")).await?;
        self.catalog.delete(id).await?;
        Ok(())
    }

    pub async fn verify(&self, id: &str) -> anyhow::Result<VerifyResult> {
        let record = self.catalog.get(id).await?;
        let checked_at = Utc::now();
        match self.object_store.get(&format!("eml/{id}")).await {
            Ok(bytes) => {
                let calculated = sha256_hex(&bytes);
                Ok(VerifyResult {
                    stored: record.hash_sha256.clone(),
                    is_valid: calculated == record.hash_sha256,
                    calculated,
                    checked_at,
                })
            }
            Err(_) => Ok(VerifyResult {
                stored: record.hash_sha256,
                calculated: String::new(),
                is_valid: false,
                checked_at,
            }),
        }
    }

    pub fn presign(&self, id: &str, ttl_minutes: i64) -> Option<PresignResult> {
        let now = Utc::now();
        let ttl = Duration::minutes(ttl_minutes);
        let token = tokens::generate(id, &self.hmac_secret, ttl, now)?;
        Some(PresignResult {
            url: format!("{}/download/{token}", self.origin),
            expires_at: now + ttl,
        })
    }

    pub async fn download(&self, token: &str) -> anyhow::Result<Option<(String, Vec<u8>)>> {
        let Some(id) = tokens::verify(token, &self.hmac_secret, Utc::now()) else {
            return Ok(None);
        };
        match self.object_store.get(&format!("eml/{id}")).await {
            Ok(bytes) => Ok(Some((id, bytes))),
            Err(_) => Ok(None),
        }
    }

    /// Prepare a one-shot export: persist `bytes` under a fresh id and hand
    /// back a presigned token. `Download`ing that token deletes the blob.
    pub async fn prepare_export(&self, bytes: Vec<u8>, content_type: &str, filename: &str, ttl_minutes: i64) -> anyhow::Result<Option<PresignResult>> {
        let export_id = new_id();
        let now = Utc::now();
        let ttl = Duration::minutes(ttl_minutes);
        let expires_at = now + ttl;

        let export = forensics_types::audit::PreparedExport {
            export_id: export_id.clone(),
            content_type: content_type.to_string(),
            filename: filename.to_string(),
            bytes,
            expires_at,
        };
        let blob = serde_json::to_vec(&export)?;
        self.object_store.put(&format!("exports/{export_id}"), &blob).await?;

        let Some(token) = tokens::generate(&export_id, &self.hmac_secret, ttl, now) else {
            self.object_store.delete(&format!("exports/{export_id}")).await?;
            return Ok(None);
        };

        Ok(Some(PresignResult {
            url: format!("{}/export/download/{token}", self.origin),
            expires_at,
        }))
    }

    /// One-shot: deletes the export blob after a successful read, so a
    /// second `Download` of the same token always misses.
    pub async fn download_export(&self, token: &str) -> anyhow::Result<Option<forensics_types::audit::PreparedExport>> {
        let Some(export_id) = tokens::verify(token, &self.hmac_secret, Utc::now()) else {
            return Ok(None);
        };
        let key = format!("exports/{export_id}");
        match self.object_store.get(&key).await {
            Ok(blob) => {
                self.object_store.delete(&key).await?;
                let export: forensics_types::audit::PreparedExport = serde_json::from_slice(&blob)?;
                Ok(Some(export))
            }
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::object_store::LocalDiskObjectStore;

    fn make_store(dir: &std::path::Path) -> AuditStore {
        let object_store = Arc::new(LocalDiskObjectStore::new(dir));
        let catalog = Arc::new(SqliteCatalog::open(":memory:").unwrap());
        AuditStore::new(object_store, catalog, b"test-secret".to_vec(), "https://example.com".to_string())
    }

    #[tokio::test]
    async fn store_then_verify_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(dir.path());
        let result = store.store(b"hello world", StoreMetadata::default()).await.unwrap();
        let verified = store.verify(&result.id).await.unwrap();
        assert!(verified.is_valid);
        assert_eq!(verified.calculated, result.hash);
    }

    #[tokio::test]
    async fn verify_missing_object_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(dir.path());
        let result = store.store(b"hello world", StoreMetadata::default()).await.unwrap();
        store.object_store.delete(&format!("eml/{}", result.id)).await.unwrap();
        let verified = store.verify(&result.id).await.unwrap();
        assert!(!verified.is_valid);
        assert_eq!(verified.calculated, "");
    }

    #[tokio::test]
    async fn presign_then_download_streams_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(dir.path());
        let result = store.store(b"hello world", StoreMetadata::default()).await.unwrap();
        let presigned = store.presign(&result.id, 60).unwrap();
        let token = presigned.url.rsplit('/').next().unwrap();
        let (id, bytes) = store.download(token).await.unwrap().unwrap();
        assert_eq!(id, result.id);
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn export_download_is_one_shot() {
        let dir = tempfile::tempdir().unwrap();
        let store = make_store(dir.path());
        let presigned = store
            .prepare_export(b"converted".to_vec(), "text/plain", "export.txt", 60)
            .await
            .unwrap()
            .unwrap();
        let token = presigned.url.rsplit('/').next().unwrap();
        let first = store.download_export(token).await.unwrap();
        assert!(first.is_some());
        let second = store.download_export(token).await.unwrap();
        assert!(second.is_none());
    }
}
