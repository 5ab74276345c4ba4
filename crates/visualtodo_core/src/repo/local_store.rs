//! Local fallback key-value storage.
//!
//! # Responsibility
//! - Persist small string values (mirrored collection, user identity) on the
//!   local machine.
//! - Offer an in-memory implementation for tests and ephemeral sessions.
//!
//! # Invariants
//! - Implementations are `Send + Sync`; persist tasks call them from the
//!   tokio worker pool.
//! - Reads of a missing key return `Ok(None)`, never an error.

use crate::db::{open_db, open_db_in_memory, DbError};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub type LocalStoreResult<T> = Result<T, LocalStoreError>;

#[derive(Debug)]
pub enum LocalStoreError {
    Db(DbError),
    /// A previous holder of the connection lock panicked.
    Poisoned,
}

impl Display for LocalStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Poisoned => write!(f, "local store lock poisoned"),
        }
    }
}

impl Error for LocalStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Poisoned => None,
        }
    }
}

impl From<DbError> for LocalStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LocalStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-to-string storage surviving session restarts.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> LocalStoreResult<()>;
    fn remove(&self, key: &str) -> LocalStoreResult<()>;
}

/// SQLite-backed local store.
pub struct SqliteLocalStore {
    conn: Mutex<Connection>,
}

impl SqliteLocalStore {
    /// Opens the store file at `path`, creating it when missing.
    pub fn open(path: impl AsRef<Path>) -> LocalStoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> LocalStoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> LocalStoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| LocalStoreError::Poisoned)
    }
}

impl LocalStore for SqliteLocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_kv WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> LocalStoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO local_kv (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        debug!(
            "event=local_set module=local_store status=ok key={key} bytes={}",
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> LocalStoreResult<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM local_kv WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local store; contents vanish with the process.
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> LocalStoreResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries.lock().map_err(|_| LocalStoreError::Poisoned)
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> LocalStoreResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> LocalStoreResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}
