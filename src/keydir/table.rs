//! KeyDir implementation
//!
//! HashMap-based index with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::KeyEntry;

/// In-memory index over the log
pub struct KeyDir {
    entries: RwLock<HashMap<Vec<u8>, KeyEntry>>,
}

impl KeyDir {
    /// Create a new empty KeyDir
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Point `key` at a new record, returning the entry it replaced
    ///
    /// Always overwrites: the caller appends in log order, so the newest call wins.
    pub fn insert(&self, key: Vec<u8>, entry: KeyEntry) -> Option<KeyEntry> {
        self.entries.write().insert(key, entry)
    }

    /// Copy of the entry for `key` (read lock)
    pub fn get(&self, key: &[u8]) -> Option<KeyEntry> {
        self.entries.read().get(key).copied()
    }

    /// Drop the entry for `key` entirely
    pub fn remove(&self, key: &[u8]) -> Option<KeyEntry> {
        self.entries.write().remove(key)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Snapshot of every indexed key, tombstones included (unordered)
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.entries.read().keys().cloned().collect()
    }

    /// Snapshot of keys that are neither deleted nor expired at `now`
    pub fn live_keys(&self, now: u32) -> Vec<Vec<u8>> {
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_live_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of live entries at `now`
    pub fn live_count(&self, now: u32) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.is_live_at(now))
            .count()
    }

    /// Number of indexed keys, tombstones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for KeyDir {
    fn default() -> Self {
        Self::new()
    }
}
