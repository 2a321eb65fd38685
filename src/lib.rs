// Library interface for the Palisade flood filter
// The delivery substrate (XDP hook, DPDK worker, pcap loop, ...) feeds
// raw frames to FloodFilter::classify_and_decide and enforces the
// returned decision.

pub mod ban_registry;
pub mod config;
pub mod conn_tracker;
pub mod filter;
pub mod frame;
pub mod lock_utils;
pub mod policy;
pub mod shard_map;
pub mod stats;

pub use config::FilterConfig;
pub use filter::{Decision, FloodFilter};
pub use policy::Verdict;
