//! Contracts between the backup engine and the record stores it backs up.
//!
//! The engine only ever calls [`Reload::reload`]. [`ContentStore`] is the
//! contract the content service uses against the same backing directory.

pub mod file_store;

pub use file_store::FileStore;

use crate::utils::errors::Result;

/// A store that caches its backing files in memory.
pub trait Reload: Send + Sync {
    /// Re-read backing files after they were replaced on disk. Failures are
    /// the store's own business and are not reported back.
    fn reload(&self);
}

/// Key-value access to content records.
pub trait ContentStore: Reload {
    fn read(&self, key: &str) -> Option<Vec<u8>>;

    fn save(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Returns `false` when there was nothing to delete
    fn delete(&self, key: &str) -> Result<bool>;

    /// All values, ordered by key
    fn read_all(&self) -> Vec<Vec<u8>>;
}
