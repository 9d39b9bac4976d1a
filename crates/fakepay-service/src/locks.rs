//! Per-key writer locks.
//!
//! Each key gets its own async mutex, created on first use and dropped from the table
//! when the last holder or waiter lets go. Holders of several keys always acquire them
//! in ascending key order, so two writers contending for the same pair can never
//! deadlock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;

type Table<K> = Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>;

/// Registry of per-key async mutexes.
pub struct KeyedLocks<K> {
    locks: Table<K>,
}

/// Exclusive access to one key. Releasing the last reference to a key removes it
/// from the registry.
pub struct KeyedGuard<'a, K: Eq + Hash> {
    table: &'a Table<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        // Table lock first: handles are only cloned under it, so a count of one
        // means nobody is waiting on this key.
        let mut table = self.table.lock();
        drop(self.guard.take());
        if table
            .get(&self.key)
            .is_some_and(|handle| Arc::strong_count(handle) == 1)
        {
            table.remove(&self.key);
        }
    }
}

impl<K: Eq + Hash + Ord + Clone> KeyedLocks<K> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn handle(&self, key: &K) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(key.clone())
            .or_default()
            .clone()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &K) -> KeyedGuard<'_, K> {
        let guard = self.handle(key).lock_owned().await;
        KeyedGuard {
            table: &self.locks,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Wait for exclusive access to every key, acquired in ascending order.
    /// Duplicate keys are locked once.
    pub async fn lock_all(&self, keys: &[&K]) -> Vec<KeyedGuard<'_, K>> {
        let mut ordered: Vec<&K> = keys.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Whether no key is held or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Ord + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
