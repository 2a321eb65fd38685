//! Flood policy engine: the per-packet decision procedure.
//!
//! Given the classifier output and the ban-registry lookup for the
//! packet's source, the engine updates the connection tracker and
//! renders exactly one terminal verdict. There are no retries and no
//! loops; every path is a constant number of table operations.

use crate::ban_registry::{BanEntry, BanRegistry};
use crate::config::{FilterConfig, ProtectedPorts};
use crate::conn_tracker::ConnTracker;
use crate::frame::{ClassifiedFrame, Transport};

/// 1 second in nanoseconds.
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Terminal verdict for one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Admit the packet.
    Pass,
    /// Admit the packet; this is the first qualifying packet from its
    /// source and a tracker record was created for it.
    PassNew,
    /// Discard the packet.
    Drop,
    /// Discard the packet; a ban was installed for its source.
    DropAndBan,
}

impl Verdict {
    /// Returns `true` if the packet is admitted.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass | Verdict::PassNew)
    }
}

/// Threshold-based flood detection over the shared tables.
pub struct PolicyEngine {
    max_connections_per_ip: u64,
    ban_duration_ns: u64,
    protected_ports: ProtectedPorts,
}

impl PolicyEngine {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            max_connections_per_ip: config.max_connections_per_ip,
            ban_duration_ns: config.ban_duration_secs * NS_PER_SEC,
            protected_ports: config.protected_ports.clone(),
        }
    }

    /// Decide one packet.
    ///
    /// `ban` is the registry lookup for the packet's source, performed
    /// by the caller before any tracker interaction. An active ban drops
    /// the packet on every port; only then does the port filter apply.
    pub fn evaluate(
        &self,
        frame: &ClassifiedFrame,
        ban: Option<BanEntry>,
        registry: &BanRegistry,
        tracker: &ConnTracker,
        now_ns: u64,
    ) -> Verdict {
        // An unexpired ban blocks the source outright, no tracker interaction.
        if ban.is_some_and(|entry| now_ns < entry.banned_until) {
            return Verdict::Drop;
        }

        // Traffic outside the protected service is untouched.
        if !self.protected_ports.contains(frame.dst_port) {
            return Verdict::Pass;
        }

        match frame.transport {
            Transport::Tcp { .. } => self.evaluate_tcp(frame, registry, tracker, now_ns),
            Transport::Udp => self.evaluate_udp(frame, tracker, now_ns),
        }
    }

    fn evaluate_tcp(
        &self,
        frame: &ClassifiedFrame,
        registry: &BanRegistry,
        tracker: &ConnTracker,
        now_ns: u64,
    ) -> Verdict {
        let syn_only = frame.transport.is_syn_only();

        // A SYN-without-ACK grows the consecutive-SYN counter; any other
        // segment resets it. The two branches are mutually exclusive on
        // the flag pair, so exactly one fires per packet.
        let updated = tracker.update(frame.src_addr, |record| {
            record.last_seen = now_ns;
            if syn_only {
                record.connection_count = record.connection_count.saturating_add(1);
            } else {
                record.connection_count = 0;
            }
        });

        match updated {
            // First packet from a new source is always admitted, even a SYN.
            None => {
                tracker.insert_new(frame.src_addr, now_ns);
                Verdict::PassNew
            }
            Some(record)
                if syn_only && record.connection_count > self.max_connections_per_ip =>
            {
                registry.insert(frame.src_addr, now_ns + self.ban_duration_ns);
                tracker.update(frame.src_addr, |r| r.banned = true);
                Verdict::DropAndBan
            }
            Some(_) => Verdict::Pass,
        }
    }

    fn evaluate_udp(
        &self,
        frame: &ClassifiedFrame,
        tracker: &ConnTracker,
        now_ns: u64,
    ) -> Verdict {
        // The UDP counter only ever grows; once past the threshold the
        // source stays dropped until its record is evicted.
        let updated = tracker.update(frame.src_addr, |record| {
            record.last_seen = now_ns;
            record.connection_count = record.connection_count.saturating_add(1);
        });

        match updated {
            None => {
                tracker.insert_new(frame.src_addr, now_ns);
                Verdict::PassNew
            }
            Some(record) if record.connection_count > self.max_connections_per_ip => {
                Verdict::Drop
            }
            Some(_) => Verdict::Pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: u32 = 0xC0A80101;

    fn engine() -> PolicyEngine {
        PolicyEngine::new(&FilterConfig::default())
    }

    fn tcp(dst_port: u16, syn: bool, ack: bool) -> ClassifiedFrame {
        ClassifiedFrame {
            src_addr: ADDR,
            dst_port,
            transport: Transport::Tcp { syn, ack },
        }
    }

    fn udp(dst_port: u16) -> ClassifiedFrame {
        ClassifiedFrame {
            src_addr: ADDR,
            dst_port,
            transport: Transport::Udp,
        }
    }

    fn decide(
        engine: &PolicyEngine,
        frame: &ClassifiedFrame,
        registry: &BanRegistry,
        tracker: &ConnTracker,
        now: u64,
    ) -> Verdict {
        let ban = registry.lookup(frame.src_addr);
        engine.evaluate(frame, ban, registry, tracker, now)
    }

    #[test]
    fn test_verdict_is_pass() {
        assert!(Verdict::Pass.is_pass());
        assert!(Verdict::PassNew.is_pass());
        assert!(!Verdict::Drop.is_pass());
        assert!(!Verdict::DropAndBan.is_pass());
    }

    #[test]
    fn test_first_tcp_packet_creates_record_and_passes() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);

        let verdict = decide(&engine, &tcp(25565, true, false), &registry, &tracker, 0);
        assert_eq!(verdict, Verdict::PassNew);

        let record = tracker.lookup(ADDR).expect("record created");
        assert_eq!(record.connection_count, 1);
    }

    #[test]
    fn test_syn_flood_bans_on_threshold_breach() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);
        let frame = tcp(25565, true, false);

        // First SYN creates the record at count 1; SYNs 2..=10 pass.
        assert_eq!(decide(&engine, &frame, &registry, &tracker, 0), Verdict::PassNew);
        for _ in 2..=10 {
            assert_eq!(decide(&engine, &frame, &registry, &tracker, 0), Verdict::Pass);
        }

        // The 11th consecutive SYN pushes the counter to 11 (> 10).
        let now = 5 * NS_PER_SEC;
        assert_eq!(
            decide(&engine, &frame, &registry, &tracker, now),
            Verdict::DropAndBan
        );

        let ban = registry.lookup(ADDR).expect("ban installed");
        assert_eq!(ban.banned_until, now + 3_600 * NS_PER_SEC);
        assert!(tracker.lookup(ADDR).unwrap().banned);
    }

    #[test]
    fn test_non_syn_resets_counter() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);
        let syn = tcp(25565, true, false);

        decide(&engine, &syn, &registry, &tracker, 0);
        for _ in 0..8 {
            decide(&engine, &syn, &registry, &tracker, 0);
        }
        assert_eq!(tracker.lookup(ADDR).unwrap().connection_count, 9);

        // An ACK segment resets the consecutive-SYN count to 0.
        let verdict = decide(&engine, &tcp(25565, false, true), &registry, &tracker, 0);
        assert_eq!(verdict, Verdict::Pass);
        assert_eq!(tracker.lookup(ADDR).unwrap().connection_count, 0);

        // SYN+ACK also counts as non-initiation and resets.
        for _ in 0..5 {
            decide(&engine, &syn, &registry, &tracker, 0);
        }
        decide(&engine, &tcp(25565, true, true), &registry, &tracker, 0);
        assert_eq!(tracker.lookup(ADDR).unwrap().connection_count, 0);
    }

    #[test]
    fn test_active_ban_drops_all_ports_and_protocols() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);

        registry.insert(ADDR, 100 * NS_PER_SEC);

        // Protected port, unprotected port, and UDP all drop while banned.
        assert_eq!(
            decide(&engine, &tcp(25565, true, false), &registry, &tracker, 0),
            Verdict::Drop
        );
        assert_eq!(
            decide(&engine, &tcp(22, false, true), &registry, &tracker, 0),
            Verdict::Drop
        );
        assert_eq!(decide(&engine, &udp(9999), &registry, &tracker, 0), Verdict::Drop);

        // No tracker interaction happened for any of them.
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_expired_ban_returns_to_tracking() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);

        registry.insert(ADDR, 100);
        let verdict = decide(&engine, &tcp(25565, true, false), &registry, &tracker, 100);
        assert_eq!(verdict, Verdict::PassNew, "ban expired at banned_until");
    }

    #[test]
    fn test_post_ban_syn_rearms_ban_if_record_survived() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);
        let frame = tcp(25565, true, false);

        for _ in 0..=10 {
            decide(&engine, &frame, &registry, &tracker, 0);
        }
        assert_eq!(tracker.lookup(ADDR).unwrap().connection_count, 11);

        // Counters are not reset by ban issuance or expiry: one SYN after
        // the ban window immediately re-bans the source.
        let after = 3_601 * NS_PER_SEC;
        assert_eq!(
            decide(&engine, &frame, &registry, &tracker, after),
            Verdict::DropAndBan
        );
        let ban = registry.lookup(ADDR).unwrap();
        assert_eq!(ban.banned_until, after + 3_600 * NS_PER_SEC);
    }

    #[test]
    fn test_unprotected_port_passes_without_tracking() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);

        for _ in 0..100 {
            assert_eq!(
                decide(&engine, &tcp(22, true, false), &registry, &tracker, 0),
                Verdict::Pass
            );
        }
        assert!(tracker.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_udp_flood_drops_past_threshold() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);
        let frame = udp(30050);

        assert_eq!(decide(&engine, &frame, &registry, &tracker, 0), Verdict::PassNew);
        for _ in 2..=10 {
            assert_eq!(decide(&engine, &frame, &registry, &tracker, 0), Verdict::Pass);
        }

        // Packet 11 and everything after it drops; the counter never resets.
        for _ in 11..=30 {
            assert_eq!(decide(&engine, &frame, &registry, &tracker, 0), Verdict::Drop);
        }
        assert_eq!(tracker.lookup(ADDR).unwrap().connection_count, 30);

        // No ban entry is installed on the UDP path.
        assert!(registry.lookup(ADDR).is_none());
    }

    #[test]
    fn test_udp_refreshes_last_seen() {
        let engine = engine();
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);
        let frame = udp(30000);

        decide(&engine, &frame, &registry, &tracker, 10);
        decide(&engine, &frame, &registry, &tracker, 20);
        assert_eq!(tracker.lookup(ADDR).unwrap().last_seen, 20);
    }

    #[test]
    fn test_custom_threshold() {
        let config = FilterConfig {
            max_connections_per_ip: 2,
            ..FilterConfig::default()
        };
        let engine = PolicyEngine::new(&config);
        let registry = BanRegistry::new(16);
        let tracker = ConnTracker::new(16);
        let frame = tcp(25565, true, false);

        decide(&engine, &frame, &registry, &tracker, 0); // count 1
        decide(&engine, &frame, &registry, &tracker, 0); // count 2
        assert_eq!(
            decide(&engine, &frame, &registry, &tracker, 0),
            Verdict::DropAndBan,
            "count 3 exceeds threshold 2"
        );
    }
}
