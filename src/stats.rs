//! Decision counters for the flood filter.
//!
//! Cheap relaxed atomics bumped on the packet path; `snapshot()` reads
//! them for operator inspection. These are internal counters, not a
//! reporting plane; exporting them anywhere is the host's business.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic packet/decision counters shared across all filter callers.
#[derive(Debug, Default)]
pub struct FilterStats {
    total_frames: AtomicU64,
    passed: AtomicU64,
    dropped: AtomicU64,
    tcp_syn_packets: AtomicU64,
    udp_packets: AtomicU64,
    bans_issued: AtomicU64,
    early_ban_drops: AtomicU64,
}

impl FilterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self) {
        self.total_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pass(&self) {
        self.passed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tcp_syn(&self) {
        self.tcp_syn_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_udp(&self) {
        self.udp_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ban(&self) {
        self.bans_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// A drop decided purely from the ban registry, before any tracker
    /// interaction.
    pub fn record_early_ban_drop(&self) {
        self.early_ban_drops.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            passed: self.passed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            tcp_syn_packets: self.tcp_syn_packets.load(Ordering::Relaxed),
            udp_packets: self.udp_packets.load(Ordering::Relaxed),
            bans_issued: self.bans_issued.load(Ordering::Relaxed),
            early_ban_drops: self.early_ban_drops.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the filter counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_frames: u64,
    pub passed: u64,
    pub dropped: u64,
    pub tcp_syn_packets: u64,
    pub udp_packets: u64,
    pub bans_issued: u64,
    pub early_ban_drops: u64,
}

impl StatsSnapshot {
    /// Share of frames dropped, as a percentage.
    pub fn drop_rate(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            (self.dropped as f64 / self.total_frames as f64) * 100.0
        }
    }

    /// Share of frames that were TCP connection initiations.
    pub fn syn_percentage(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            (self.tcp_syn_packets as f64 / self.total_frames as f64) * 100.0
        }
    }
}
