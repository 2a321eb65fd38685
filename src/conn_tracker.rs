//! Connection tracker: bounded map from source address to per-source
//! activity.
//!
//! A record exists only after its source has sent at least one
//! qualifying packet to a protected port. Records are updated on every
//! subsequent qualifying packet and destroyed only by LRU eviction,
//! never deleted explicitly.

use crate::shard_map::ShardedLru;

/// Per-source activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionRecord {
    /// Monotonic timestamp (ns) of the most recent qualifying packet.
    pub last_seen: u64,
    /// Protocol-dependent counter: consecutive SYN-without-ACK segments
    /// for TCP, cumulative datagrams for UDP.
    pub connection_count: u64,
    /// Informational flag set when a ban was issued for this source.
    /// The authoritative ban state lives in the ban registry.
    pub banned: bool,
}

/// Bounded per-source activity table with LRU eviction.
pub struct ConnTracker {
    records: ShardedLru<u32, ConnectionRecord>,
}

impl ConnTracker {
    /// Create a tracker holding at most `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: ShardedLru::new(capacity),
        }
    }

    /// Look up the record for an address.
    pub fn lookup(&self, addr: u32) -> Option<ConnectionRecord> {
        self.records.get(&addr)
    }

    /// Create the initial record for a source that has no record yet.
    /// The first packet counts, so the record starts at count 1.
    pub fn insert_new(&self, addr: u32, now_ns: u64) {
        self.records.insert(
            addr,
            ConnectionRecord {
                last_seen: now_ns,
                connection_count: 1,
                banned: false,
            },
        );
    }

    /// Apply an in-place mutation to an existing record, returning the
    /// record after mutation, or `None` if the source has no record
    /// (never tracked, or evicted).
    pub fn update<F>(&self, addr: u32, mutate: F) -> Option<ConnectionRecord>
    where
        F: FnOnce(&mut ConnectionRecord),
    {
        self.records.update(&addr, mutate)
    }

    /// Number of tracked sources.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }
}
