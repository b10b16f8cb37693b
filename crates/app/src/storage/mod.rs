//! Key-value storage backing the persisted cart.

use thiserror::Error;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error touching the backing file.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// The value does not fit in the remaining space.
    #[error("storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded {
        /// Bytes the write needs
        needed: usize,
        /// Bytes left in the store
        available: usize,
    },

    /// The key cannot be used as a storage name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// String-keyed, string-valued store, like browser local storage.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the write fails or exceeds the quota.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes a value; deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backing store cannot be modified.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
