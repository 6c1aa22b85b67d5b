//! Cache entry operations.
//!
//! Entries map a request identity (method + URL) to a stored response
//! snapshot within one named store. Writes are UPSERTs: the last writer
//! for a key wins.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response snapshot as persisted in a cache store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, status_text: impl Into<String>, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self { status, status_text: status_text.into(), headers, body }
    }
}

/// A stored entry together with its request identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub response: CachedResponse,
    pub stored_at: String,
}

/// Lightweight listing row, without headers or body.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size: u64,
    pub stored_at: String,
}

fn upsert(
    conn: &rusqlite::Connection, store: &str, method: &str, url: &str, response: &CachedResponse, stored_at: &str,
) -> Result<(), Error> {
    let key_hash = compute_cache_key(method, url);
    let headers_json = serde_json::to_string(&response.headers)?;

    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![store, stored_at],
    )?;
    conn.execute(
        "INSERT INTO cache_entries (
            store, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(store, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            key_hash,
            method.to_ascii_uppercase(),
            url,
            response.status as i64,
            &response.status_text,
            headers_json,
            &response.body,
            stored_at,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Store a response under `(method, url)` in the named store.
    ///
    /// The store is created if it does not exist yet.
    pub async fn put_entry(&self, store: &str, method: &str, url: &str, response: &CachedResponse) -> Result<(), Error> {
        let store = store.to_string();
        let method = method.to_string();
        let url = url.to_string();
        let response = response.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> { upsert(conn, &store, &method, &url, &response, &stored_at) })
            .await
            .map_err(Error::from)
    }

    /// Store several GET responses in one transaction.
    ///
    /// Either every entry is written or none is.
    pub async fn put_entries(&self, store: &str, entries: Vec<(String, CachedResponse)>) -> Result<usize, Error> {
        let store = store.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                for (url, response) in &entries {
                    upsert(&tx, &store, "GET", url, response, &stored_at)?;
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a response by request identity.
    ///
    /// Returns None on a miss, including when the store does not exist.
    pub async fn match_entry(&self, store: &str, method: &str, url: &str) -> Result<Option<CachedEntry>, Error> {
        let store = store.to_string();
        let key_hash = compute_cache_key(method, url);

        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status, status_text, headers_json, body, stored_at
                     FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Vec<u8>>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                });

                let (key_hash, method, url, status, status_text, headers_json, body, stored_at) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
                let status = u16::try_from(status)
                    .map_err(|_| Error::InvalidInput(format!("stored status out of range: {status}")))?;

                Ok(Some(CachedEntry {
                    key_hash,
                    method,
                    url,
                    response: CachedResponse { status, status_text, headers, body },
                    stored_at,
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns false if it was not present.
    pub async fn delete_entry(&self, store: &str, method: &str, url: &str) -> Result<bool, Error> {
        let store = store.to_string();
        let key_hash = compute_cache_key(method, url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                    params![store, key_hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List the entries of a store, ordered by URL.
    pub async fn list_entries(&self, store: &str) -> Result<Vec<EntrySummary>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntrySummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, LENGTH(body), stored_at
                     FROM cache_entries WHERE store = ?1 ORDER BY url ASC, method ASC",
                )?;
                let entries = stmt
                    .query_map(params![store], |row| {
                        Ok(EntrySummary {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get::<_, i64>(2)? as u16,
                            size: row.get::<_, i64>(3)? as u64,
                            stored_at: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }
}
