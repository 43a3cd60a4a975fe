//! SQLite Store Implementation

use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{KeyValueStore, Result, StoreError};

/// File name of the store inside the data directory
const STORE_FILE: &str = "veritas.db";

/// Persisted key-value store
///
/// A single connection behind a `Mutex`; all methods take `&self`, so the
/// store is shared as `Arc<Store>`.
pub struct Store {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl Store {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Open the store.
    ///
    /// `path` may be a database file or a directory (the file is then
    /// created inside it). Paths without an extension are directories.
    /// `None` uses the platform data directory.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) if p.is_dir() || p.extension().is_none() => p.join(STORE_FILE),
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "veritasvault", "veritas").ok_or_else(
                    || StoreError::Init("Could not determine project directories".to_string()),
                )?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join(STORE_FILE)
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        Self::configure_connection(&conn)?;
        let applied = super::migrations::apply_migrations(&conn)?;
        tracing::debug!(path = %path.display(), applied, "Store opened");

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Init("Connection lock poisoned".into()))?;
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }
}

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Init("Connection lock poisoned".into()))?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Init("Connection lock poisoned".into()))?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Init("Connection lock poisoned".into()))?;
        let removed = conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}
