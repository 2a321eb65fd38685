//! Ban registry: bounded map from source address to ban expiry.
//!
//! Consulted first on every packet, before the port filter, so a banned
//! source is dropped regardless of where it sends traffic. Entries are
//! never removed when they expire; an expired entry is inert and sits in
//! the table until LRU eviction reclaims its slot.

use crate::shard_map::ShardedLru;

/// A time-boxed ban for one source address.
///
/// Presence in the registry does not by itself mean "currently banned";
/// callers must compare `now < banned_until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanEntry {
    /// Monotonic timestamp (ns) after which the address is no longer blocked.
    pub banned_until: u64,
}

/// Bounded registry of banned source addresses with LRU eviction.
pub struct BanRegistry {
    bans: ShardedLru<u32, BanEntry>,
}

impl BanRegistry {
    /// Create a registry holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            bans: ShardedLru::new(capacity),
        }
    }

    /// Look up the ban entry for an address. O(1), non-blocking.
    /// Returns `None` for addresses never banned or already evicted.
    pub fn lookup(&self, addr: u32) -> Option<BanEntry> {
        self.bans.get(&addr)
    }

    /// Returns `true` if the address has an unexpired ban.
    pub fn is_banned(&self, addr: u32, now_ns: u64) -> bool {
        self.lookup(addr)
            .is_some_and(|entry| now_ns < entry.banned_until)
    }

    /// Install or overwrite a ban, evicting the least-recently-used
    /// entry if the registry is full.
    pub fn insert(&self, addr: u32, banned_until: u64) {
        self.bans.insert(addr, BanEntry { banned_until });
    }

    /// Number of entries currently held (active and expired).
    pub fn len(&self) -> usize {
        self.bans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bans.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.bans.capacity()
    }
}
