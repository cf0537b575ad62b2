use crate::{DnsError, DnsRecord, RecordType};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

/// Answers are cached no longer than this, regardless of the upstream TTL
/// (spec §5: "capped at 5 min").
const MAX_TTL: Duration = Duration::from_secs(300);

type Key = (String, RecordType);

struct Entry {
    records: Vec<DnsRecord>,
    expires_at: Instant,
}

/// TTL cache with single-flight deduplication keyed by `(name, type)`, so
/// that two concurrent lookups for the same selector only perform one
/// upstream query (spec §5).
pub struct DnsCache {
    entries: DashMap<Key, Entry>,
    inflight: DashMap<Key, Arc<AsyncMutex<()>>>,
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            inflight: DashMap::new(),
        }
    }

    fn get_fresh(&self, key: &Key) -> Option<Vec<DnsRecord>> {
        let entry = self.entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.records.clone())
        } else {
            None
        }
    }

    fn lock_for(&self, key: &Key) -> Arc<AsyncMutex<()>> {
        self.inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Resolve `key` via `query`, serving from cache when possible and
    /// coalescing concurrent misses for the same key into one call to
    /// `query`.
    pub async fn get_or_query<F, Fut>(
        &self,
        name: &str,
        rrtype: RecordType,
        query: F,
    ) -> Result<Vec<DnsRecord>, DnsError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(Vec<DnsRecord>, u32), DnsError>>,
    {
        let key: Key = (name.to_ascii_lowercase(), rrtype);

        if let Some(records) = self.get_fresh(&key) {
            return Ok(records);
        }

        let lock = self.lock_for(&key);
        let _guard = lock.lock().await;

        // Another task may have populated the cache while we waited.
        if let Some(records) = self.get_fresh(&key) {
            return Ok(records);
        }

        let (records, ttl_secs) = query().await?;
        let ttl = Duration::from_secs(ttl_secs as u64).min(MAX_TTL);
        self.entries.insert(
            key.clone(),
            Entry {
                records: records.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        // Drop our inflight marker so the map doesn't grow without bound;
        // a fresh Mutex will be created on the next miss for this key.
        self.inflight.remove(&key);

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_lookups_single_flight() {
        let cache = Arc::new(DnsCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_query("sel._domainkey.example.com", RecordType::Txt, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok((
                            vec![DnsRecord {
                                data: "v=DKIM1; p=abc".to_string(),
                                ttl: 300,
                            }],
                            300,
                        ))
                    })
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_requeried() {
        let cache = DnsCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let calls = calls.clone();
            cache
                .get_or_query("short.example.com", RecordType::A, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok((
                        vec![DnsRecord {
                            data: "1.2.3.4".to_string(),
                            ttl: 0,
                        }],
                        0,
                    ))
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
