//! Store Module
//!
//! Persisted key-value storage, the server-side equivalent of browser
//! local storage:
//! - SQLite-backed [`Store`] in the platform data directory
//! - In-memory [`MemoryStore`] for tests and ephemeral sessions
//!
//! Values are opaque strings (usually JSON). Access is read-then-write with
//! last-writer-wins semantics.

mod memory;
mod migrations;
mod sqlite;

pub use memory::MemoryStore;
pub use migrations::MIGRATIONS;
pub use sqlite::Store;

/// Store error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Store result type
pub type Result<T> = std::result::Result<T, StoreError>;

/// Key-value persistence used by the dashboard and AI history tracker.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key, returning whether it existed
    fn remove(&self, key: &str) -> Result<bool>;
}
