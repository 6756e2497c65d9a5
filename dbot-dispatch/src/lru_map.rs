//! Bounded map with least-recently-used eviction, over [`lru::LruCache`].
//!
//! Eviction is never silent: [`LruMap::put`] returns the evicted entry so callers can clean
//! up any secondary index that points at it.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;

pub struct LruMap<K, V> {
    cache: LruCache<K, V>,
}

impl<K: Hash + Eq, V> LruMap<K, V> {
    /// Creates an empty map. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.cache.contains(key)
    }

    /// Inserts or updates `key` and marks it most recently used.
    ///
    /// Updating an existing key never evicts. Inserting a new key into a full map evicts
    /// the least recently used entry and returns it.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.cache.contains(&key) {
            // `push` hands back the replaced value for an existing key; that is no eviction.
            self.cache.push(key, value);
            return None;
        }
        self.cache.push(key, value)
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.cache.get(key)
    }

    /// Looks up `key` without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.cache.peek(key)
    }

    /// Removes `key` and returns its value.
    pub fn take(&mut self, key: &K) -> Option<V> {
        self.cache.pop(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.cache.pop(key)
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.cache.iter().rev().map(|(k, _)| k)
    }
}
