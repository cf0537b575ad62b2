//! `eml_records` catalog capability (spec §"Out of scope": raw SQL
//! transport) with a `sqlite`-backed default implementation. Query shape
//! grounded on kumomta's `tsa-daemon/src/database.rs` and
//! `kumod/src/accounting.rs` (`Connection::open_thread_safe`,
//! `prepare`/`bind`/`next` via `spawn_blocking`).

use crate::errors::CatalogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forensics_types::audit::{EmlRecord, ListFilters, ListResult};
use sqlite::{ConnectionThreadSafe, State};
use std::sync::Arc;

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn insert(&self, record: &EmlRecord) -> Result<(), CatalogError>;
    async fn get(&self, id: &str) -> Result<EmlRecord, CatalogError>;
    async fn list(&self, filters: &ListFilters) -> Result<ListResult, CatalogError>;
    async fn delete(&self, id: &str) -> Result<(), CatalogError>;
}

/// Escape `%`, `_`, and `\` in a user-supplied `LIKE` operand, matching
/// `ESCAPE '\'`. Without this, a search string containing `%` or `_` would
/// match more rows than the literal substring the user typed.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub struct SqliteCatalog {
    db: Arc<ConnectionThreadSafe>,
}

impl SqliteCatalog {
    pub fn open(path: &str) -> Result<Self, CatalogError> {
        let db = sqlite::Connection::open_thread_safe(path)?;
        db.execute(
            r#"
            CREATE TABLE IF NOT EXISTS eml_records (
                id TEXT PRIMARY KEY,
                hash_sha256 TEXT NOT NULL,
                from_domain TEXT,
                subject_preview TEXT,
                stored_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                metadata TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_eml_records_hash ON eml_records(hash_sha256);
            CREATE INDEX IF NOT EXISTS idx_eml_records_expires ON eml_records(expires_at);
            "#,
        )?;
        Ok(Self { db: Arc::new(db) })
    }

    fn read_record(stmt: &sqlite::Statement) -> Result<EmlRecord, CatalogError> {
        let metadata: String = stmt.read::<String, _>("metadata")?;
        Ok(EmlRecord {
            id: stmt.read::<String, _>("id")?,
            hash_sha256: stmt.read::<String, _>("hash_sha256")?,
            from_domain: stmt.read::<Option<String>, _>("from_domain")?,
            subject_preview: stmt.read::<Option<String>, _>("subject_preview")?,
            stored_at: parse_ts(&stmt.read::<String, _>("stored_at")?),
            expires_at: parse_ts(&stmt.read::<String, _>("expires_at")?),
            metadata: serde_json::from_str(&metadata)?,
        })
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn insert(&self, record: &EmlRecord) -> Result<(), CatalogError> {
        let db = self.db.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || -> Result<(), CatalogError> {
            let mut stmt = db.prepare(
                "INSERT INTO eml_records
                    (id, hash_sha256, from_domain, subject_preview, stored_at, expires_at, metadata)
                    VALUES (:id, :hash, :from_domain, :subject, :stored_at, :expires_at, :metadata)",
            )?;
            stmt.bind((":id", record.id.as_str()))?;
            stmt.bind((":hash", record.hash_sha256.as_str()))?;
            stmt.bind((":from_domain", record.from_domain.as_deref()))?;
            stmt.bind((":subject", record.subject_preview.as_deref()))?;
            stmt.bind((":stored_at", record.stored_at.to_rfc3339().as_str()))?;
            stmt.bind((":expires_at", record.expires_at.to_rfc3339().as_str()))?;
            let metadata = serde_json::to_string(&record.metadata)?;
            stmt.bind((":metadata", metadata.as_str()))?;
            while stmt.next()? != State::Done {}
            Ok(())
        })
        .await
        .expect("catalog insert task panicked")
    }

    async fn get(&self, id: &str) -> Result<EmlRecord, CatalogError> {
        let db = self.db.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || -> Result<EmlRecord, CatalogError> {
            let mut stmt = db.prepare("SELECT * FROM eml_records WHERE id = :id")?;
            stmt.bind((":id", id.as_str()))?;
            if stmt.next()? == State::Row {
                SqliteCatalog::read_record(&stmt)
            } else {
                Err(CatalogError::NotFound(id))
            }
        })
        .await
        .expect("catalog get task panicked")
    }

    async fn list(&self, filters: &ListFilters) -> Result<ListResult, CatalogError> {
        let db = self.db.clone();
        let filters = filters.clone();
        tokio::task::spawn_blocking(move || -> Result<ListResult, CatalogError> {
            let mut clauses: Vec<String> = Vec::new();
            if filters.search.is_some() {
                clauses.push(
                    "(from_domain LIKE :search ESCAPE '\\' OR subject_preview LIKE :search ESCAPE '\\' \
                      OR id LIKE :search ESCAPE '\\' OR hash_sha256 LIKE :search ESCAPE '\\')"
                        .to_string(),
                );
            }
            if filters.from_domain.is_some() {
                clauses.push("from_domain = :from_domain".to_string());
            }
            if filters.date_from.is_some() {
                clauses.push("stored_at >= :date_from".to_string());
            }
            if filters.date_to.is_some() {
                clauses.push("stored_at <= :date_to".to_string());
            }
            if filters.hash_prefix.is_some() {
                clauses.push("hash_sha256 LIKE :hash_prefix ESCAPE '\\'".to_string());
            }

            let where_clause = if clauses.is_empty() {
                String::new()
            } else {
                format!("WHERE {}", clauses.join(" AND "))
            };

            let sort_column = filters.safe_sort_column();
            let sort_dir = match filters.sort_order {
                Some(forensics_types::audit::SortOrder::Asc) => "ASC",
                _ => "DESC",
            };

            let page_size = filters.page_size();
            let offset = (filters.page() - 1) * page_size;

            let count_sql = format!("SELECT COUNT(*) as c FROM eml_records {where_clause}");
            let select_sql = format!(
                "SELECT * FROM eml_records {where_clause} ORDER BY {sort_column} {sort_dir} LIMIT :limit OFFSET :offset"
            );

            let bind_params = |stmt: &mut sqlite::Statement| -> Result<(), CatalogError> {
                if let Some(search) = &filters.search {
                    let escaped = format!("%{}%", escape_like(search));
                    stmt.bind((":search", escaped.as_str()))?;
                }
                if let Some(domain) = &filters.from_domain {
                    stmt.bind((":from_domain", domain.as_str()))?;
                }
                if let Some(from) = &filters.date_from {
                    stmt.bind((":date_from", from.to_rfc3339().as_str()))?;
                }
                if let Some(to) = &filters.date_to {
                    stmt.bind((":date_to", to.to_rfc3339().as_str()))?;
                }
                if let Some(prefix) = &filters.hash_prefix {
                    let escaped = format!("{}%", escape_like(prefix));
                    stmt.bind((":hash_prefix", escaped.as_str()))?;
                }
                Ok(())
            };

            let mut count_stmt = db.prepare(&count_sql)?;
            bind_params(&mut count_stmt)?;
            count_stmt.next()?;
            let total: i64 = count_stmt.read::<i64, _>("c")?;

            let mut stmt = db.prepare(&select_sql)?;
            bind_params(&mut stmt)?;
            stmt.bind((":limit", page_size as i64))?;
            stmt.bind((":offset", offset as i64))?;

            let mut records = Vec::new();
            while stmt.next()? == State::Row {
                records.push(SqliteCatalog::read_record(&stmt)?);
            }

            Ok(ListResult {
                records,
                page: filters.page(),
                page_size,
                total: total.max(0) as u64,
            })
        })
        .await
        .expect("catalog list task panicked")
    }

    async fn delete(&self, id: &str) -> Result<(), CatalogError> {
        let db = self.db.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), CatalogError> {
            let mut stmt = db.prepare("DELETE FROM eml_records WHERE id = :id")?;
            stmt.bind((":id", id.as_str()))?;
            while stmt.next()? != State::Done {}
            Ok(())
        })
        .await
        .expect("catalog delete task panicked")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample(id: &str, domain: &str) -> EmlRecord {
        let now = Utc::now();
        EmlRecord {
            id: id.to_string(),
            hash_sha256: format!("hash-{id}"),
            from_domain: Some(domain.to_string()),
            subject_preview: Some("hello 100% discount".to_string()),
            stored_at: now,
            expires_at: now + Duration::days(90),
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let catalog = SqliteCatalog::open(":memory:").unwrap();
        catalog.insert(&sample("id1", "example.com")).await.unwrap();
        let record = catalog.get("id1").await.unwrap();
        assert_eq!(record.from_domain.as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn like_escape_matches_literal_percent() {
        let catalog = SqliteCatalog::open(":memory:").unwrap();
        catalog.insert(&sample("id1", "example.com")).await.unwrap();
        let filters = ListFilters {
            search: Some("100%".to_string()),
            ..Default::default()
        };
        let result = catalog.list(&filters).await.unwrap();
        assert_eq!(result.total, 1);
    }

    #[tokio::test]
    async fn unsortable_column_falls_back_to_stored_at() {
        let catalog = SqliteCatalog::open(":memory:").unwrap();
        catalog.insert(&sample("id1", "a.com")).await.unwrap();
        let filters = ListFilters {
            sort_by: Some("hash_sha256; DROP TABLE eml_records;--".to_string()),
            ..Default::default()
        };
        let result = catalog.list(&filters).await;
        assert!(result.is_ok());
        // the table must still exist afterwards
        assert!(catalog.get("id1").await.is_ok());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let catalog = SqliteCatalog::open(":memory:").unwrap();
        catalog.insert(&sample("id1", "a.com")).await.unwrap();
        catalog.delete("id1").await.unwrap();
        assert!(matches!(catalog.get("id1").await, Err(CatalogError::NotFound(_))));
    }
}
