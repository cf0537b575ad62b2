//! §4.11 audit store wire types: catalog rows, list filters, and the
//! presign/verify/export response shapes. The storage mechanics
//! (`ObjectStore`/`Catalog` traits, HMAC tokens) live in `forensics-audit`;
//! this module only carries the data everyone else needs to pass around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single row of `eml_records`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmlRecord {
    pub id: String,
    pub hash_sha256: String,
    pub from_domain: Option<String>,
    pub subject_preview: Option<String>,
    pub stored_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

/// Arbitrary caller-supplied metadata for a `Store` call.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    #[serde(default)]
    pub from_domain: Option<String>,
    #[serde(default)]
    pub subject_preview: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResult {
    pub id: String,
    pub hash: String,
    pub stored_at: DateTime<Utc>,
}

/// The only sortable columns (§8 "LIKE escape" / SQL-injection defense):
/// anything else falls back to `stored_at desc`.
pub const SORTABLE_COLUMNS: &[&str] = &["stored_at", "from_domain", "subject_preview"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilters {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub from_domain: Option<String>,
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hash_prefix: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ListFilters {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(Self::DEFAULT_PAGE_SIZE).clamp(1, Self::MAX_PAGE_SIZE)
    }

    /// The allow-listed sort column, falling back to `stored_at` for
    /// anything not on the list (including attempted SQL injection).
    pub fn safe_sort_column(&self) -> &'static str {
        match self.sort_by.as_deref() {
            Some("from_domain") => "from_domain",
            Some("subject_preview") => "subject_preview",
            _ => "stored_at",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    pub records: Vec<EmlRecord>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub stored: String,
    pub calculated: String,
    pub is_valid: bool,
    pub checked_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignResult {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// A one-shot export: persisted separately from `eml_records` under its own
/// id, deleted by `Download` after the first successful read.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedExport {
    pub export_id: String,
    pub content_type: String,
    pub filename: String,
    #[serde(with = "bytes_b64")]
    pub bytes: Vec<u8>,
    pub expires_at: DateTime<Utc>,
}

mod bytes_b64 {
    use data_encoding::BASE64;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        BASE64.encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        BASE64.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// `base64url(JSON(payload)) + "." + hex(HMAC_SHA256(payload, secret))`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPayload {
    pub id: String,
    pub exp: DateTime<Utc>,
}
