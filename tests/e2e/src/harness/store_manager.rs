//! Test Store Manager
//!
//! Provides isolated persisted stores for testing:
//! - Temporary stores that are automatically cleaned up
//! - Reopening the same file to simulate a new session
//! - Pre-seeded settings documents

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use veritas_core::{KeyValueStore, Store, SETTINGS_KEY};

/// Manager for test stores
///
/// Each manager owns one SQLite file in a temporary directory. Dropping the
/// manager deletes it.
///
/// # Example
///
/// ```rust,ignore
/// let manager = TestStoreManager::new_temp();
/// let first = manager.open();
/// // ... write settings through a DashboardState over `first` ...
/// let second = manager.open(); // same file, fresh connection
/// ```
pub struct TestStoreManager {
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: TempDir,
    db_path: PathBuf,
}

impl TestStoreManager {
    /// Create a manager over a fresh temporary directory
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_veritas.db");

        Self {
            _temp_dir: temp_dir,
            db_path,
        }
    }

    /// Open a new connection to the managed store
    pub fn open(&self) -> Arc<Store> {
        Arc::new(Store::new(Some(self.db_path.clone())).expect("Failed to open test store"))
    }

    /// Open the store as a trait object, as the dashboard expects it
    pub fn open_dyn(&self) -> Arc<dyn KeyValueStore> {
        self.open()
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Write a raw settings document, bypassing validation
    pub fn seed_settings(&self, raw: &str) {
        self.open()
            .set(SETTINGS_KEY, raw)
            .expect("Failed to seed settings");
    }

    /// Raw stored value for `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.open().get(key).expect("Failed to read test store")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_store_creation() {
        let manager = TestStoreManager::new_temp();
        let store = manager.open();
        assert!(manager.path().exists());
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_values_survive_reopen() {
        let manager = TestStoreManager::new_temp();
        manager.open().set("k", "v").unwrap();
        assert_eq!(manager.raw("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_managers_are_isolated() {
        let a = TestStoreManager::new_temp();
        let b = TestStoreManager::new_temp();
        a.seed_settings("{}");
        assert!(b.raw(SETTINGS_KEY).is_none());
    }
}
