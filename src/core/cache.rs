//! Bounded cache with oldest-first eviction
//!
//! Used for every performance cache in the engine (sun sprites, precipitation
//! textures, light streaks, color strings). Entries are pure derived artifacts:
//! clearing or evicting them only costs a re-render, never changes output.

use std::collections::HashMap;
use std::hash::Hash;

/// Bounded map that evicts its least recently used entry at capacity
///
/// Access order is tracked to determine which entry to evict when the cache
/// is full. Capacities are small (tens of entries), so the order is a plain
/// vector.
pub struct BoundedCache<K, V> {
    /// Map of keys to cached values
    entries: HashMap<K, V>,
    /// Access order: oldest first, newest last
    /// When an entry is accessed, it's moved to the end
    access_order: Vec<K>,
    /// Maximum number of entries to keep
    max_entries: usize,
}

impl<K: Copy + Eq + Hash, V> BoundedCache<K, V> {
    /// Create a new cache with the given capacity
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries to keep (at least 1)
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: HashMap::with_capacity(max_entries),
            access_order: Vec::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Get an entry by key
    ///
    /// Updates the access order to mark this entry as recently used.
    pub fn get(&mut self, key: K) -> Option<&V> {
        if self.entries.contains_key(&key) {
            self.update_access_order(key);
            self.entries.get(&key)
        } else {
            None
        }
    }

    /// Insert an entry
    ///
    /// If the cache is at capacity, the least recently used entry is evicted first.
    /// If an entry with the same key already exists, it is replaced.
    ///
    /// # Returns
    /// The evicted value if one was removed to make space, or the replaced value if it existed
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.entries.contains_key(&key) {
            self.remove_from_access_order(key);
        }

        let evicted = if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.evict_oldest()
        } else {
            None
        };

        let replaced = self.entries.insert(key, value);
        self.access_order.push(key);

        evicted.or(replaced)
    }

    /// Get an entry, building and inserting it with `build` on a miss
    pub fn get_or_insert_with(&mut self, key: K, build: impl FnOnce() -> V) -> &V {
        if self.entries.contains_key(&key) {
            self.update_access_order(key);
        } else {
            let value = build();
            self.insert(key, value);
        }
        // Present either way: refreshed above or just inserted
        &self.entries[&key]
    }

    /// Remove an entry
    pub fn remove(&mut self, key: K) -> Option<V> {
        self.remove_from_access_order(key);
        self.entries.remove(&key)
    }

    /// Check if the cache contains a key
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capacity the cache was created with
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_order.clear();
    }

    /// Evict the oldest (least recently used) entry
    pub fn evict_oldest(&mut self) -> Option<V> {
        if let Some(key) = self.access_order.first().copied() {
            self.remove(key)
        } else {
            None
        }
    }

    fn update_access_order(&mut self, key: K) {
        self.remove_from_access_order(key);
        self.access_order.push(key);
    }

    fn remove_from_access_order(&mut self, key: K) {
        if let Some(pos) = self.access_order.iter().position(|&k| k == key) {
            self.access_order.remove(pos);
        }
    }
}
