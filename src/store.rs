//! Key-Value Store
//!
//! Session state is written as JSON strings under fixed keys. Writes are
//! best-effort: a failing store is logged and the in-memory state stays
//! authoritative.

use std::fmt;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the cart lines.
pub const CART_KEY: &str = "cart";

/// Key holding placed orders.
pub const ORDERS_KEY: &str = "orders";

/// Key holding favorites.
pub const FAVORITES_KEY: &str = "favorites";

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded.
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    /// The write would exceed the configured quota.
    #[error("quota exceeded writing {key} ({needed} bytes, {available} available)")]
    QuotaExceeded {
        /// Key being written
        key: String,

        /// Bytes the write needs
        needed: usize,

        /// Bytes still free
        available: usize,
    },

    /// The key is not usable as a storage name.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Persistent string storage addressed by key.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Reads the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the write is rejected or fails.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Deletes `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backing storage fails.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Outcome of reading a JSON value from the store.
#[derive(Debug)]
pub(crate) enum Loaded<T> {
    /// Nothing stored under the key.
    Missing,

    /// Stored and decoded.
    Value(T),

    /// Stored but undecodable.
    Corrupt,

    /// The store itself could not be read; nothing is known about the value.
    Unavailable,
}

/// Reads and decodes `key`, logging anything that goes wrong.
pub(crate) fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Loaded<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Loaded::Missing,
        Err(error) => {
            error!(key, %error, "failed to read from store");
            return Loaded::Unavailable;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Loaded::Value(value),
        Err(error) => {
            warn!(key, %error, "discarding unreadable stored value");
            Loaded::Corrupt
        }
    }
}

/// Decodes each stored entry on its own, dropping the ones that do not decode.
///
/// Returns the decoded entries and the number dropped.
pub(crate) fn decode_entries<T: DeserializeOwned>(key: &str, entries: Vec<Value>) -> (Vec<T>, usize) {
    let mut decoded = Vec::with_capacity(entries.len());
    let mut dropped = 0;

    for entry in entries {
        match serde_json::from_value(entry) {
            Ok(value) => decoded.push(value),
            Err(error) => {
                warn!(key, %error, "dropping invalid stored entry");
                dropped += 1;
            }
        }
    }

    (decoded, dropped)
}

/// Encodes and writes `value` under `key`, logging and swallowing failures.
///
/// Returns whether the write succeeded.
pub(crate) fn persist<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> bool {
    let result = serde_json::to_string(value)
        .map_err(StoreError::from)
        .and_then(|encoded| store.set(key, &encoded));

    match result {
        Ok(()) => true,
        Err(error) => {
            error!(key, %error, "failed to persist state");
            false
        }
    }
}

/// Deletes `key`, logging and swallowing failures.
pub(crate) fn forget(store: &dyn KeyValueStore, key: &str) -> bool {
    match store.remove(key) {
        Ok(()) => true,
        Err(error) => {
            error!(key, %error, "failed to remove state");
            false
        }
    }
}

/// A store whose reads always fail while writes land in an inner [`MemoryStore`].
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct UnreadableStore {
    pub(crate) inner: MemoryStore,
}

#[cfg(test)]
impl KeyValueStore for UnreadableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk unavailable")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}
