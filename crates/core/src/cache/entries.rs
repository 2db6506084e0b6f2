//! Entry operations: write, look up, count.
//!
//! Writes create the target store on demand, like opening a store before
//! putting into it.

use super::connection::CacheDb;
use crate::Error;
use crate::request::{HttpResponse, RequestKey};
use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};

/// A response stored under a request key.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub store: String,
    pub method: String,
    pub url: String,
    pub response: HttpResponse,
    pub stored_at: String,
}

const ENTRY_COLUMNS: &str = "e.store, e.method, e.url, e.status, e.headers_json, e.body, e.stored_at";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CachedEntry, String)> {
    let headers_json: String = row.get(4)?;
    let body: Vec<u8> = row.get(5)?;
    let entry = CachedEntry {
        store: row.get(0)?,
        method: row.get(1)?,
        url: row.get(2)?,
        response: HttpResponse { status: row.get(3)?, headers: Vec::new(), body: Bytes::from(body) },
        stored_at: row.get(6)?,
    };
    Ok((entry, headers_json))
}

fn decode_headers(mut entry: CachedEntry, headers_json: &str) -> Result<CachedEntry, Error> {
    entry.response.headers = serde_json::from_str(headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    Ok(entry)
}

fn put_row(conn: &rusqlite::Connection, store: &str, key: &RequestKey, response: &HttpResponse) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
        params![store, now],
    )?;
    conn.execute(
        "INSERT INTO entries (store, key_hash, method, url, status, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(store, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            &key.hash,
            &key.method,
            &key.url,
            response.status,
            headers_json,
            response.body.as_ref(),
            now,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Write a response under `key` in `store`, replacing any previous entry.
    pub async fn put(&self, store: &str, key: &RequestKey, response: &HttpResponse) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.clone();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { put_row(conn, &store, &key, &response) })
            .await
            .map_err(Error::from)
    }

    /// Write several entries in one transaction: all of them or none.
    pub async fn put_all(&self, store: &str, entries: Vec<(RequestKey, HttpResponse)>) -> Result<(), Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for (key, response) in &entries {
                    put_row(&tx, &store, key, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `key` in one store.
    pub async fn match_in(&self, store: &str, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        let store = store.to_string();
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.store = ?1 AND e.key_hash = ?2");
                let result = conn.query_row(&sql, params![store, hash], row_to_entry);

                match result {
                    Ok((entry, headers_json)) => decode_headers(entry, &headers_json).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `key` across all stores, oldest store first.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<CachedEntry>, Error> {
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let sql = format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries e
                     JOIN stores s ON s.name = e.store
                     WHERE e.key_hash = ?1
                     ORDER BY s.id ASC LIMIT 1"
                );
                let result = conn.query_row(&sql, params![hash], row_to_entry);

                match result {
                    Ok((entry, headers_json)) => decode_headers(entry, &headers_json).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store.
    pub async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
