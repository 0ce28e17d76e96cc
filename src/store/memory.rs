//! In-memory store

use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;

use crate::store::{KeyValueStore, StoreError};

/// A shared in-memory store with an optional byte quota.
///
/// Clones share the same map, which lets two sessions (or a session and a
/// test) observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<FxHashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes once keys and values exceed `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota: Some(bytes),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(quota) = self.quota {
            let used: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);

            if needed > available {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn clones_share_entries() -> TestResult {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("cart", "[]")?;

        assert_eq!(other.get("cart")?, Some("[]".to_string()));
        assert_eq!(other.len(), 1);

        Ok(())
    }

    #[test]
    fn quota_counts_existing_entries_except_overwritten_key() -> TestResult {
        let store = MemoryStore::with_quota(16);

        store.set("cart", "12345678")?;
        store.set("cart", "abcdefghijkl")?;

        let result = store.set("orders", "x");

        match result {
            Err(StoreError::QuotaExceeded {
                key,
                needed,
                available,
            }) => {
                assert_eq!(key, "orders");
                assert_eq!(needed, 7);
                assert_eq!(available, 0);
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }

        Ok(())
    }

    #[test]
    fn remove_missing_key_is_ok() -> TestResult {
        let store = MemoryStore::new();

        store.remove("favorites")?;

        assert!(store.is_empty());

        Ok(())
    }
}
