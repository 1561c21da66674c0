use std::path::Path;

use loginguard_core::{KeyValueStore, StorageError};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Namespace for origin-scoped durable values (the throttle's keys).
pub const LOCAL_NAMESPACE: &str = "local";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("failed to create storage directory: {0}")]
    Dir(#[source] std::io::Error),
}

/// SQLite-backed key-value storage.
///
/// One table holds every namespace: `local` for values that outlive the
/// session, `session:<id>` for values scoped to one session. Writes are
/// single statements, so each key is updated atomically; there is no
/// cross-key transaction.
pub struct SqliteStore {
    conn: Connection,
    namespace: String,
}

impl SqliteStore {
    /// Open (or create) the database at the given path and run migrations.
    /// `:memory:` opens a private in-memory database.
    pub fn open(db_path: &Path, namespace: &str) -> Result<Self, StoreError> {
        if db_path != Path::new(":memory:") {
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(StoreError::Dir)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             CREATE TABLE IF NOT EXISTS kv (
                 namespace TEXT NOT NULL,
                 key TEXT NOT NULL,
                 value TEXT NOT NULL,
                 updated_at TEXT NOT NULL,
                 PRIMARY KEY (namespace, key)
             );",
        )?;

        tracing::debug!(path = %db_path.display(), namespace, "storage opened");
        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }
}

#[cfg(test)]
impl SqliteStore {
    fn count(&self) -> Result<u64, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM kv WHERE namespace = ?1",
            params![self.namespace],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn clear(&mut self) -> Result<usize, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE namespace = ?1", params![self.namespace])?;
        Ok(removed)
    }
}

fn backend(e: rusqlite::Error) -> StorageError {
    StorageError::Backend(Box::new(e))
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row(
                "SELECT value FROM kv WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(backend)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO kv (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![self.namespace, key, value, updated_at],
            )
            .map_err(backend)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "DELETE FROM kv WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
            )
            .map_err(backend)?;
        Ok(())
    }
}
