//! Key-value backends the collection accessor reads and writes through.

use super::error::StoreResult;
use crate::db;
use rusqlite::Connection;

/// Raw string storage addressed by key, the local-storage contract.
pub trait KeyValueBackend {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<bool>;
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Backend over the workspace database's `kv_store` table.
pub struct SqliteBackend<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBackend<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl KeyValueBackend for SqliteBackend<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(db::kv_get(self.conn, key)?)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        db::kv_set(self.conn, key, value, &super::now_ts())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        Ok(db::kv_remove(self.conn, key)?)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(db::kv_keys(self.conn)?)
    }
}

#[cfg(test)]
pub use memory::MemoryBackend;
