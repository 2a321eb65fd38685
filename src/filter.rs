//! Filter entry point: one call, one frame, one irrevocable decision.
//!
//! The delivery substrate hands in raw frame bytes and a monotonic
//! timestamp; the filter classifies the frame, consults the ban
//! registry, runs the flood policy against the connection tracker, and
//! returns the binary decision the substrate enforces. The filter itself
//! performs no I/O and owns no network resources.

use tracing::{debug, info};

use crate::ban_registry::BanRegistry;
use crate::config::FilterConfig;
use crate::conn_tracker::ConnTracker;
use crate::frame::{classify, Transport};
use crate::policy::{PolicyEngine, Verdict};
use crate::stats::{FilterStats, StatsSnapshot};

/// Binary decision returned to the delivery substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward the frame.
    Pass,
    /// Discard the frame.
    Drop,
}

/// Inline admission-control filter for a game-server listener.
///
/// All methods take `&self`; share one instance across packet-processing
/// threads via `Arc` and call [`FloodFilter::classify_and_decide`] once
/// per frame. Per-key races on the shared tables are tolerated: the
/// filter is a best-effort flood mitigator, not an exact accounting
/// ledger.
pub struct FloodFilter {
    registry: BanRegistry,
    tracker: ConnTracker,
    policy: PolicyEngine,
    stats: FilterStats,
}

impl FloodFilter {
    /// Build a filter from a validated configuration.
    pub fn new(config: FilterConfig) -> Self {
        Self {
            registry: BanRegistry::new(config.registry_capacity),
            tracker: ConnTracker::new(config.tracker_capacity),
            policy: PolicyEngine::new(&config),
            stats: FilterStats::new(),
        }
    }

    /// Build a filter with the default thresholds and capacities.
    pub fn with_defaults() -> Self {
        Self::new(FilterConfig::default())
    }

    /// Decide one frame.
    ///
    /// `now_ns` is a monotonic timestamp supplied by the caller, in
    /// nanoseconds. Malformed or out-of-scope frames pass unconditionally
    /// (fail-open); there is no error to surface and nothing to retry.
    pub fn classify_and_decide(&self, frame: &[u8], now_ns: u64) -> Decision {
        self.stats.record_frame();

        let Some(classified) = classify(frame) else {
            self.stats.record_pass();
            return Decision::Pass;
        };

        match classified.transport {
            Transport::Tcp { .. } if classified.transport.is_syn_only() => {
                self.stats.record_tcp_syn();
            }
            Transport::Udp => self.stats.record_udp(),
            Transport::Tcp { .. } => {}
        }

        // The registry lookup happens before any tracker interaction and
        // before the port filter; its result feeds the policy engine.
        let ban = self.registry.lookup(classified.src_addr);
        let ban_active = ban.is_some_and(|entry| now_ns < entry.banned_until);

        let verdict =
            self.policy
                .evaluate(&classified, ban, &self.registry, &self.tracker, now_ns);

        if verdict.is_pass() {
            self.stats.record_pass();
            return Decision::Pass;
        }

        self.stats.record_drop();
        if verdict == Verdict::DropAndBan {
            self.stats.record_ban();
            info!(
                src_addr = classified.src_addr,
                dst_port = classified.dst_port,
                "SYN flood detected, source banned"
            );
        } else if ban_active {
            self.stats.record_early_ban_drop();
        } else {
            debug!(
                src_addr = classified.src_addr,
                dst_port = classified.dst_port,
                "flood threshold exceeded, dropping"
            );
        }
        Decision::Drop
    }

    /// Current decision counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Number of sources currently tracked.
    pub fn tracked_sources(&self) -> usize {
        self.tracker.len()
    }

    /// Number of ban entries currently held (active and expired).
    pub fn banned_sources(&self) -> usize {
        self.registry.len()
    }
}
