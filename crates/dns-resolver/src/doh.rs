use crate::cache::DnsCache;
use crate::{DnsError, DnsRecord, RecordType, Resolver};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_TTL: u32 = 60;

#[derive(Deserialize)]
struct DohAnswer {
    #[serde(default, rename = "TTL")]
    ttl: u32,
    data: String,
}

#[derive(Deserialize)]
struct DohResponse {
    #[serde(default, rename = "Status")]
    status: i32,
    #[serde(default, rename = "Answer")]
    answer: Vec<DohAnswer>,
}

/// DNS-over-HTTPS resolver (spec §4.2 "public-key retrieval via
/// DNS-over-HTTPS"). Speaks the widely supported `application/dns-json`
/// GET contract (Cloudflare's `1.1.1.1/dns-query`, Google's `dns.google`).
pub struct DohResolver {
    client: reqwest::Client,
    base_url: String,
    cache: DnsCache,
}

impl DohResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("reqwest client builds"),
            base_url: base_url.into(),
            cache: DnsCache::new(),
        }
    }

    async fn query_upstream(
        &self,
        name: &str,
        rrtype: RecordType,
    ) -> Result<(Vec<DnsRecord>, u32), DnsError> {
        let resp = self
            .client
            .get(&self.base_url)
            .header("accept", "application/dns-json")
            .query(&[("name", name), ("type", rrtype.as_query_str())])
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    DnsError::Timeout
                } else {
                    DnsError::QueryFailed(err.to_string())
                }
            })?;

        let parsed: DohResponse = resp
            .json()
            .await
            .map_err(|err| DnsError::QueryFailed(format!("malformed DoH response: {err}")))?;

        if parsed.status != 0 {
            return Err(DnsError::NoRecords);
        }
        if parsed.answer.is_empty() {
            return Err(DnsError::NoRecords);
        }

        let max_ttl = parsed.answer.iter().map(|a| a.ttl).max().unwrap_or(DEFAULT_TTL);
        let records = parsed
            .answer
            .into_iter()
            .map(|a| DnsRecord {
                data: match rrtype {
                    RecordType::Txt => unquote_txt(&a.data),
                    _ => a.data,
                },
                ttl: a.ttl,
            })
            .collect();

        Ok((records, max_ttl))
    }
}

#[async_trait]
impl Resolver for DohResolver {
    async fn resolve(&self, name: &str, rrtype: RecordType) -> Result<Vec<DnsRecord>, DnsError> {
        if name.is_empty() {
            return Err(DnsError::InvalidName("empty name".to_string()));
        }
        let owned_name = name.to_string();
        let query_name = owned_name.clone();
        self.cache
            .get_or_query(&owned_name, rrtype, move || async move {
                self.query_upstream(&query_name, rrtype).await
            })
            .await
    }
}

/// A TXT RDATA value may be split across multiple quoted
/// `<character-string>` segments (RFC 1035 §3.3.14); DoH JSON responses
/// render this as e.g. `"v=DKIM1; k=rsa; " "p=MIIB..."`. Concatenate the
/// segments with the quoting stripped, as RFC 6376 §3.6.2.2 expects.
pub fn unquote_txt(data: &str) -> String {
    let mut out = String::new();
    let mut in_quotes = false;
    let mut chars = data.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(&next) = chars.peek() {
                    out.push(next);
                    chars.next();
                }
            }
            _ if in_quotes => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_concatenates_segments() {
        assert_eq!(unquote_txt("\"v=DKIM1; k=rsa; \" \"p=abc123\""), "v=DKIM1; k=rsa; p=abc123");
        assert_eq!(unquote_txt("\"v=spf1 -all\""), "v=spf1 -all");
    }
}
