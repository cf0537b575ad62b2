use crate::{DnsError, DnsRecord, RecordType, Resolver};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// An in-memory `Resolver` for tests, mirroring kumomta's `TestResolver`
/// pattern: seed records with `with_txt`/`with_a`, then hand it to code
/// that expects a `Resolver` capability.
#[derive(Default)]
pub struct StaticResolver {
    records: RwLock<HashMap<(String, RecordType), Vec<String>>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_txt(self, name: &str, value: &str) -> Self {
        self.insert(name, RecordType::Txt, value);
        self
    }

    pub fn with_a(self, name: &str, value: &str) -> Self {
        self.insert(name, RecordType::A, value);
        self
    }

    pub fn with_mx(self, name: &str, value: &str) -> Self {
        self.insert(name, RecordType::Mx, value);
        self
    }

    fn insert(&self, name: &str, rrtype: RecordType, value: &str) {
        self.records
            .write()
            .unwrap()
            .entry((name.to_ascii_lowercase(), rrtype))
            .or_default()
            .push(value.to_string());
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, name: &str, rrtype: RecordType) -> Result<Vec<DnsRecord>, DnsError> {
        let key = (name.to_ascii_lowercase(), rrtype);
        match self.records.read().unwrap().get(&key) {
            Some(values) if !values.is_empty() => Ok(values
                .iter()
                .map(|v| DnsRecord {
                    data: v.clone(),
                    ttl: 300,
                })
                .collect()),
            _ => Err(DnsError::NoRecords),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_txt_lookup() {
        let resolver = StaticResolver::new().with_txt("sel._domainkey.example.com", "v=DKIM1; p=abc");
        let out = resolver.resolve_txt("sel._domainkey.example.com").await.unwrap();
        assert_eq!(out, vec!["v=DKIM1; p=abc".to_string()]);
    }

    #[tokio::test]
    async fn missing_record_is_no_records() {
        let resolver = StaticResolver::new();
        assert_eq!(resolver.resolve_txt("nope.example.com").await, Err(DnsError::NoRecords));
    }
}
