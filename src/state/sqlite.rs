use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task;

use super::store::DurableStore;
use crate::error::PersistenceError;

/// SQLite-backed durable store.
///
/// Holds one row per collection key with the serialized value and the time
/// it was last written. Statements run on the blocking pool so a slow disk
/// never stalls timers or input handling on the runtime thread.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the store at `db_path` and initialize the schema.
    ///
    /// The parent directory is created when missing.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Preference database opened");

        Self::init_schema(&conn)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
            db_path,
        })
    }

    /// Store backed by a private in-memory database
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// Default location of the database file
    ///
    /// - Linux: ~/.local/share/shelfex/shelfex.db
    /// - macOS: ~/Library/Application Support/shelfex/shelfex.db
    /// - Windows: %APPDATA%\shelfex\shelfex.db
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
        path.push("shelfex");
        path.push("shelfex.db");
        Some(path)
    }

    fn init_schema(conn: &Connection) -> Result<(), PersistenceError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS prefs (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Number of keys currently stored
    pub fn key_count(&self) -> Result<i64, PersistenceError> {
        let conn = lock(&self.conn)?;
        let count = conn.query_row("SELECT COUNT(*) FROM prefs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Run `op` against the connection on the blocking pool
    async fn with_conn<R, F>(&self, op: F) -> Result<R, PersistenceError>
    where
        F: FnOnce(&Connection) -> Result<R, PersistenceError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            op(&conn)
        })
        .await
        .map_err(|e| PersistenceError::Unavailable(format!("Task join error: {}", e)))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
    conn.lock()
        .map_err(|_| PersistenceError::Unavailable("connection lock poisoned".to_string()))
}

#[async_trait(?Send)]
impl DurableStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM prefs WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let bytes = value.len();
        let (owned_key, value) = (key.to_string(), value.to_string());
        self.with_conn(move |conn| {
            // Single statement upsert: a write either lands whole or not at all
            conn.execute(
                "INSERT INTO prefs (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![owned_key, value, Utc::now().timestamp_millis()],
            )?;
            Ok(())
        })
        .await?;
        tracing::debug!(key, bytes, "Preference written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM prefs WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}
