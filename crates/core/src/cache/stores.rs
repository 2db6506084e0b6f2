//! Store-level operations: create, list, delete.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

impl CacheDb {
    /// Create a store if it does not exist yet.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a store exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All store names in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns false if the store did not exist.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE store = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
