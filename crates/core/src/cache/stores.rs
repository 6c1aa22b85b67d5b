//! Named cache store lifecycle.
//!
//! A store is the unit of invalidation: bumping the version tag creates a new
//! store, and activation deletes the old ones together with their entries.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Summary of a cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheDb {
    /// Open a store, creating it if absent.
    ///
    /// Returns true if the store was created by this call.
    pub async fn open_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let created = conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(created > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a store exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List all store names, oldest first.
    pub async fn list_stores(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// List all stores with their entry counts.
    pub async fn list_store_info(&self) -> Result<Vec<StoreInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, s.created_at, COUNT(e.key_hash)
                     FROM cache_stores s
                     LEFT JOIN cache_entries e ON e.store = s.name
                     GROUP BY s.name, s.created_at
                     ORDER BY s.created_at ASC, s.name ASC",
                )?;
                let stores = stmt
                    .query_map([], |row| {
                        Ok(StoreInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stores)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns false if no store had that name.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachedResponse;

    #[tokio::test]
    async fn test_open_store_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.open_store("hearth-v1").await.unwrap());
        assert!(!db.open_store("hearth-v1").await.unwrap());
        assert_eq!(db.list_stores().await.unwrap(), vec!["hearth-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_has_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(!db.has_store("hearth-v1").await.unwrap());
        db.open_store("hearth-v1").await.unwrap();
        assert!(db.has_store("hearth-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_store_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let response = CachedResponse::new(200, "OK", Vec::new(), b"body".to_vec());
        db.put_entry("hearth-v1", "GET", "https://example.com/app.js", &response)
            .await
            .unwrap();
        db.put_entry("hearth-v2", "GET", "https://example.com/app.js", &response)
            .await
            .unwrap();

        assert!(db.delete_store("hearth-v1").await.unwrap());
        assert!(!db.delete_store("hearth-v1").await.unwrap());

        assert!(
            db.match_entry("hearth-v1", "GET", "https://example.com/app.js")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            db.match_entry("hearth-v2", "GET", "https://example.com/app.js")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_list_store_info_counts_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("empty").await.unwrap();
        let response = CachedResponse::new(200, "OK", Vec::new(), Vec::new());
        db.put_entry("full", "GET", "https://example.com/a.css", &response)
            .await
            .unwrap();
        db.put_entry("full", "GET", "https://example.com/b.css", &response)
            .await
            .unwrap();

        let info = db.list_store_info().await.unwrap();
        let full = info.iter().find(|s| s.name == "full").unwrap();
        let empty = info.iter().find(|s| s.name == "empty").unwrap();
        assert_eq!(full.entries, 2);
        assert_eq!(empty.entries, 0);
    }

    #[tokio::test]
    async fn test_delete_store_failure_leaves_others_deletable() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("pinned").await.unwrap();
        db.open_store("stale").await.unwrap();
        db.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER keep_pinned BEFORE DELETE ON cache_stores WHEN old.name = 'pinned'
                     BEGIN SELECT RAISE(ABORT, 'locked'); END;",
                )
            })
            .await
            .unwrap();

        assert!(matches!(db.delete_store("pinned").await, Err(Error::Database(_))));
        assert!(db.delete_store("stale").await.unwrap());
        assert_eq!(db.list_stores().await.unwrap(), vec!["pinned".to_string()]);
    }
}
