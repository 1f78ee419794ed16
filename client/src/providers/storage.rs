//! Persisted key-value storage trait.

use crate::error::StorageError;
use std::future::Future;

/// Device-local key-value storage that survives process restarts.
///
/// Values are opaque strings. There is no locking: concurrent writers race
/// and the last write wins.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value.
    ///
    /// # Returns
    ///
    /// `None` if the key was never set or has been removed.
    ///
    /// # Errors
    ///
    /// Returns error if the backing medium cannot be read.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns error if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove a value. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns error if the backing medium cannot be written.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}
