//! Named store and entry CRUD operations.
//!
//! A store is one cache generation (or the reserved API store); an entry is
//! a full response snapshot keyed by request identity. Every write is a
//! whole-row replace of one key, so last-writer-wins is the only consistency
//! model concurrent handlers need.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response snapshot.
///
/// Immutable once written except for full replacement under the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CacheDb {
    /// Open (create if absent) a named store.
    ///
    /// Idempotent: opening an existing store is a no-op.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a named store exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                        params![name],
                        |row| row.get(0),
                    )
                    .map_err(Error::from)?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns true if the store existed. Entries go with it via cascade.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// All store names, in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace an entry in a store.
    ///
    /// Uses UPSERT semantics: a prior entry under the same key is fully
    /// replaced. The store row is created if it doesn't exist yet, so
    /// duplicate precache writes and racing write-throughs are both benign.
    pub async fn put_entry(&self, store: &str, entry: &StoredResponse) -> Result<(), Error> {
        let store = store.to_string();
        let entry = entry.clone();
        let headers_json = serde_json::to_string(&entry.headers).map_err(|e| Error::Encoding(e.to_string()))?;
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store, created_at],
                )?;
                conn.execute(
                    "INSERT INTO entries (store, key, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(store, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        store,
                        entry.key,
                        entry.method,
                        entry.url,
                        entry.status,
                        headers_json,
                        entry.body,
                        entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by store and key.
    ///
    /// Returns None if the store or the key doesn't exist.
    pub async fn get_entry(&self, store: &str, key: &str) -> Result<Option<StoredResponse>, Error> {
        let store = store.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, method, url, status, headers_json, body, stored_at
                    FROM entries WHERE store = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![store, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u16>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                });

                match result {
                    Ok((key, method, url, status, headers_json, body, stored_at)) => {
                        let headers = serde_json::from_str(&headers_json).map_err(|e| Error::Encoding(e.to_string()))?;
                        Ok(Some(StoredResponse { key, method, url, status, headers, body, stored_at }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns true if it existed.
    pub async fn delete_entry(&self, store: &str, key: &str) -> Result<bool, Error> {
        let store = store.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE store = ?1 AND key = ?2",
                    params![store, key],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// All entry keys in a store.
    pub async fn entry_keys(&self, store: &str) -> Result<Vec<String>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM entries WHERE store = ?1")?;
                let keys = stmt
                    .query_map(params![store], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store.
    pub async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE store = ?1",
                    params![store],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
