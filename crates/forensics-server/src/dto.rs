//! Request/response bodies for the HTTP routes (spec §6). These are
//! presentation-only shapes; the domain types they wrap live in
//! `forensics-types`.

use chrono::{DateTime, Utc};
use forensics_types::audit::StoreMetadata;
use forensics_types::headers::HeaderList;
use forensics_types::results::DomainResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub domain: String,
    #[serde(default)]
    pub dkim_selector: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub domain: String,
    pub spf: RecordLookup,
    pub dmarc: RecordLookup,
    pub dkim: Option<RecordLookup>,
}

#[derive(Debug, Serialize)]
pub struct RecordLookup {
    pub found: bool,
    pub record: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    #[serde(with = "body_b64")]
    pub eml_base64: Vec<u8>,
    #[serde(default)]
    pub metadata: StoreMetadata,
}

#[derive(Debug, Deserialize)]
pub struct SecurityDkimRequest {
    pub headers: HeaderList,
    #[serde(with = "body_b64")]
    pub body: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct SecurityArcRequest {
    pub headers: HeaderList,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ConfusablesRequest {
    One { domain: String },
    Many { domains: Vec<String> },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ConfusablesResponse {
    One(DomainResult),
    Many(Vec<DomainResult>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub total_records: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted: usize,
    pub failed: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_records: u64,
    pub domains: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
pub struct PresignQuery {
    #[serde(default = "default_expires_minutes")]
    pub expires: i64,
}

fn default_expires_minutes() -> i64 {
    60
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPrepareRequest {
    #[serde(with = "body_b64")]
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
    #[serde(default = "default_expires_minutes")]
    pub expires: i64,
}

mod body_b64 {
    use data_encoding::BASE64;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        BASE64.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}
