//! The `Resolver` capability: DNS-over-HTTPS lookups with a TTL cache and
//! single-flight deduplication.
//!
//! Raw DNS transport is an external collaborator (spec §1); this crate only
//! has to expose the shape the rest of the workspace needs — TXT lookups for
//! DKIM/ARC public keys and SPF/DMARC records, plus A/MX/CNAME for the
//! `/api/dns/*` passthrough and the TLS/domain analyzers.

mod cache;
mod doh;
mod error;
mod test_resolver;

pub use cache::DnsCache;
pub use doh::DohResolver;
pub use error::DnsError;
pub use test_resolver::StaticResolver;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Txt,
    A,
    Mx,
    Cname,
}

impl RecordType {
    pub fn as_query_str(&self) -> &'static str {
        match self {
            RecordType::Txt => "TXT",
            RecordType::A => "A",
            RecordType::Mx => "MX",
            RecordType::Cname => "CNAME",
        }
    }
}

impl std::str::FromStr for RecordType {
    type Err = DnsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" => Ok(RecordType::Txt),
            "a" => Ok(RecordType::A),
            "mx" => Ok(RecordType::Mx),
            "cname" => Ok(RecordType::Cname),
            other => Err(DnsError::InvalidName(format!("unknown record type {other}"))),
        }
    }
}

/// A single resolved record, as returned to the `/api/dns/*` passthrough
/// and to callers that want TTL visibility.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DnsRecord {
    pub data: String,
    pub ttl: u32,
}

/// The DNS capability used throughout the workspace. Raw transport,
/// caching, and single-flight coalescing are implementation details of
/// whichever type implements this trait.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, name: &str, rrtype: RecordType) -> Result<Vec<DnsRecord>, DnsError>;

    /// Convenience: TXT lookup returning only the record text, with
    /// DKIM-style multi-string TXT records already concatenated by the
    /// transport.
    async fn resolve_txt(&self, name: &str) -> Result<Vec<String>, DnsError> {
        Ok(self
            .resolve(name, RecordType::Txt)
            .await?
            .into_iter()
            .map(|r| r.data)
            .collect())
    }

    async fn resolve_a(&self, name: &str) -> Result<Vec<String>, DnsError> {
        Ok(self
            .resolve(name, RecordType::A)
            .await?
            .into_iter()
            .map(|r| r.data)
            .collect())
    }

    async fn resolve_mx(&self, name: &str) -> Result<Vec<String>, DnsError> {
        Ok(self
            .resolve(name, RecordType::Mx)
            .await?
            .into_iter()
            .map(|r| r.data)
            .collect())
    }

    async fn resolve_cname(&self, name: &str) -> Result<Vec<String>, DnsError> {
        Ok(self
            .resolve(name, RecordType::Cname)
            .await?
            .into_iter()
            .map(|r| r.data)
            .collect())
    }
}
