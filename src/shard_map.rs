//! Sharded bounded LRU store backing the ban registry and the
//! connection tracker.
//!
//! Each table is split into independently-locked shards so that packet
//! processing on separate cores rarely contends on the same mutex, and
//! never blocks behind a table-wide lock. A key always maps to the same
//! shard; capacity is partitioned across shards, so the table as a whole
//! never holds more entries than its configured capacity and each shard
//! evicts its own least-recently-used entry when full.
//!
//! Per-key updates are best-effort under concurrency: two callers racing
//! on the same key serialize on the shard mutex, but a lookup followed by
//! an update is not atomic across calls. Lost increments are an accepted
//! approximation; entry lifetime is not, which is why every structural
//! mutation happens under the shard lock.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::lock_utils::lock_or_recover;

/// Default shard count; keys spread across shards by hash.
const DEFAULT_SHARDS: usize = 16;

/// A bounded, concurrently-accessible LRU map.
pub struct ShardedLru<K, V> {
    shards: Vec<Mutex<LruCache<K, V>>>,
    capacity: usize,
}

impl<K: Hash + Eq, V: Clone> ShardedLru<K, V> {
    /// Create a store with the given total capacity and the default
    /// shard count.
    pub fn new(capacity: usize) -> Self {
        Self::with_shards(capacity, DEFAULT_SHARDS)
    }

    /// Create a store with an explicit shard count. The shard count is
    /// clamped so every shard holds at least one entry.
    pub fn with_shards(capacity: usize, shards: usize) -> Self {
        let capacity = capacity.max(1);
        let shards = shards.clamp(1, capacity);

        // Partition capacity across shards; the first `capacity % shards`
        // shards absorb the remainder so the per-shard sum equals the
        // configured total exactly.
        let base = capacity / shards;
        let remainder = capacity % shards;

        let shards = (0..shards)
            .map(|i| {
                let shard_cap = base + usize::from(i < remainder);
                let shard_cap = NonZeroUsize::new(shard_cap).unwrap_or(NonZeroUsize::MIN);
                Mutex::new(LruCache::new(shard_cap))
            })
            .collect();

        Self { shards, capacity }
    }

    fn shard(&self, key: &K) -> &Mutex<LruCache<K, V>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.shards.len();
        &self.shards[idx]
    }

    /// Look up a key, promoting it to most-recently-used.
    /// Never blocks beyond the shard mutex; O(1).
    pub fn get(&self, key: &K) -> Option<V> {
        let mut shard = lock_or_recover(self.shard(key), "lru shard (get)");
        shard.get(key).cloned()
    }

    /// Insert or overwrite an entry, evicting the shard's
    /// least-recently-used entry if the shard is at capacity.
    pub fn insert(&self, key: K, value: V) {
        let mut shard = lock_or_recover(self.shard(&key), "lru shard (insert)");
        shard.put(key, value);
    }

    /// Apply an in-place mutation to an existing entry, promoting it to
    /// most-recently-used. Returns a copy of the entry after mutation,
    /// or `None` if the key is absent (never seen, or already evicted).
    pub fn update<F>(&self, key: &K, mutate: F) -> Option<V>
    where
        F: FnOnce(&mut V),
    {
        let mut shard = lock_or_recover(self.shard(key), "lru shard (update)");
        let value = shard.get_mut(key)?;
        mutate(value);
        Some(value.clone())
    }

    /// Total number of entries across all shards.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| lock_or_recover(s, "lru shard (len)").len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured total capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
