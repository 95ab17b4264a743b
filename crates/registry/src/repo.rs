//! Repository for registered item facts.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{ItemRow, RegistryRecord};
use exn::ResultExt;
use sqlx::SqlitePool;
use tracing::debug;

/// Read/write access to the `item` ledger.
///
/// The `(item_name, model_num, pack_hash)` triple is unique. Recording an
/// already-known triple refreshes its timestamp and reports "not newly
/// inserted", which is what keeps repeated merges of the same pack from
/// spamming notification listeners.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a fact. Returns `true` if the triple was newly inserted.
    ///
    /// SQLite reports one affected row for both arms of an upsert, so the
    /// "was this new" bit needs the two-statement form: insert-or-ignore,
    /// then refresh the timestamp when the insert was ignored.
    pub async fn record(&self, record: &RegistryRecord) -> Result<bool> {
        let updated_on = record.updated_on.unix_timestamp();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let inserted = sqlx::query(include_str!("../queries/insert_item.sql"))
            .bind(&record.item_name)
            .bind(record.model_num)
            .bind(&record.pack_hash)
            .bind(updated_on)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected()
            > 0;
        if !inserted {
            sqlx::query(include_str!("../queries/touch_item.sql"))
                .bind(updated_on)
                .bind(&record.item_name)
                .bind(record.model_num)
                .bind(&record.pack_hash)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        if inserted {
            debug!(item = %record.item_name, model = record.model_num, "registered new item fact");
        }
        Ok(inserted)
    }

    /// The `limit` most recently updated records, newest first.
    ///
    /// Timestamp ties are broken by insertion order (rowid), so two facts
    /// registered by the same merge come back in the order they were seen.
    pub async fn recent(&self, limit: usize) -> Result<Vec<RegistryRecord>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let rows: Vec<ItemRow> = sqlx::query_as(include_str!("../queries/recent_items.sql"))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(RegistryRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::UtcDateTime;

    fn fact(item: &str, model: i64, hash: &str, at: i64) -> RegistryRecord {
        RegistryRecord::new(item, model, hash, UtcDateTime::from_unix_timestamp(at).unwrap())
    }

    async fn repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    #[tokio::test]
    async fn test_first_record_is_new() {
        let repo = repo().await;
        assert!(repo.record(&fact("bow", 1, "hash-a", 1000)).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_triple_is_not_new_and_stays_single_row() {
        let repo = repo().await;
        assert!(repo.record(&fact("bow", 1, "hash-a", 1000)).await.unwrap());
        assert!(!repo.record(&fact("bow", 1, "hash-a", 2000)).await.unwrap());
        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.len(), 1);
        // The duplicate still refreshed the timestamp.
        assert_eq!(recent[0].updated_on.unix_timestamp(), 2000);
    }

    #[tokio::test]
    async fn test_differing_hash_is_a_new_row() {
        let repo = repo().await;
        assert!(repo.record(&fact("bow", 1, "hash-a", 1000)).await.unwrap());
        assert!(repo.record(&fact("bow", 1, "hash-b", 1000)).await.unwrap());
        assert_eq!(repo.recent(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recent_orders_newest_first_with_rowid_tiebreak() {
        let repo = repo().await;
        repo.record(&fact("first", 1, "h", 1000)).await.unwrap();
        repo.record(&fact("older", 2, "h", 500)).await.unwrap();
        repo.record(&fact("tied", 3, "h", 1000)).await.unwrap();
        let recent = repo.recent(10).await.unwrap();
        let names: Vec<&str> = recent.iter().map(|r| r.item_name.as_str()).collect();
        // Equal timestamps: later insertion wins.
        assert_eq!(names, vec!["tied", "first", "older"]);
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let repo = repo().await;
        for i in 0..5 {
            repo.record(&fact("item", i, "h", 1000 + i)).await.unwrap();
        }
        assert_eq!(repo.recent(3).await.unwrap().len(), 3);
    }
}
