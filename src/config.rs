//! Operator-facing configuration for the flood filter.
//!
//! Covers the knobs the filter exposes: table capacities, the per-source
//! threshold, the ban duration, and the protected port set. Everything
//! else about the filter's behavior is fixed by the decision procedure.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// =============================================================================
// VALIDATION CONSTANTS
// =============================================================================

/// Maximum per-source connection threshold
pub const MAX_CONNECTION_THRESHOLD: u64 = 100_000;

/// Minimum per-source connection threshold
pub const MIN_CONNECTION_THRESHOLD: u64 = 1;

/// Maximum ban duration (24 hours)
pub const MAX_BAN_DURATION_SECS: u64 = 86_400;

/// Minimum ban duration (10 seconds)
pub const MIN_BAN_DURATION_SECS: u64 = 10;

/// Maximum entries either table may be configured to hold
pub const MAX_TABLE_CAPACITY: usize = 10_000_000;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Validation errors for filter configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Protected port set cannot be empty")]
    EmptyPortSet,

    #[error("Invalid port range: start {start} > end {end}")]
    InvalidPortRange { start: u16, end: u16 },

    #[error("Connection threshold {value} out of range [{min}, {max}]")]
    InvalidThreshold { value: u64, min: u64, max: u64 },

    #[error("Ban duration {value}s out of range [{min}, {max}]s")]
    InvalidBanDuration { value: u64, min: u64, max: u64 },

    #[error("{table} capacity {value} out of range [1, {max}]")]
    InvalidCapacity {
        table: &'static str,
        value: usize,
        max: usize,
    },
}

// =============================================================================
// PROTECTED PORT SET
// =============================================================================

/// An inclusive range of destination ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

/// The set of destination ports the filter protects.
///
/// Traffic to any other port is passed through untouched. The ban check
/// still applies first: a banned source is dropped on every port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedPorts {
    /// Individual ports
    #[serde(default)]
    pub ports: Vec<u16>,
    /// Inclusive port ranges
    #[serde(default)]
    pub ranges: Vec<PortRange>,
}

impl Default for ProtectedPorts {
    fn default() -> Self {
        // Game listener on 25565 plus the dynamic instance range
        Self {
            ports: vec![25565],
            ranges: vec![PortRange {
                start: 30000,
                end: 30100,
            }],
        }
    }
}

impl ProtectedPorts {
    /// Returns `true` if the port belongs to the protected set.
    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
            || self
                .ranges
                .iter()
                .any(|r| port >= r.start && port <= r.end)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ports.is_empty() && self.ranges.is_empty() {
            return Err(ConfigError::EmptyPortSet);
        }
        for range in &self.ranges {
            if range.start > range.end {
                return Err(ConfigError::InvalidPortRange {
                    start: range.start,
                    end: range.end,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// FILTER CONFIG
// =============================================================================

/// Flood filter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Maximum tracked source addresses
    #[serde(default = "default_tracker_capacity")]
    pub tracker_capacity: usize,

    /// Maximum banned source addresses
    #[serde(default = "default_registry_capacity")]
    pub registry_capacity: usize,

    /// Per-source SYN/packet threshold; the packet pushing the counter
    /// past this value is dropped
    #[serde(default = "default_max_connections_per_ip")]
    pub max_connections_per_ip: u64,

    /// Duration of an issued ban in seconds
    #[serde(default = "default_ban_duration_secs")]
    pub ban_duration_secs: u64,

    /// Destination ports covered by flood tracking
    #[serde(default)]
    pub protected_ports: ProtectedPorts,
}

fn default_tracker_capacity() -> usize {
    10_000
}
fn default_registry_capacity() -> usize {
    1_000
}
fn default_max_connections_per_ip() -> u64 {
    10
}
fn default_ban_duration_secs() -> u64 {
    3_600
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            tracker_capacity: default_tracker_capacity(),
            registry_capacity: default_registry_capacity(),
            max_connections_per_ip: default_max_connections_per_ip(),
            ban_duration_secs: default_ban_duration_secs(),
            protected_ports: ProtectedPorts::default(),
        }
    }
}

impl FilterConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        let config: FilterConfig =
            toml::from_str(&contents).context("Failed to parse filter config")?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(&self).context("Failed to serialize config")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker_capacity == 0 || self.tracker_capacity > MAX_TABLE_CAPACITY {
            return Err(ConfigError::InvalidCapacity {
                table: "tracker",
                value: self.tracker_capacity,
                max: MAX_TABLE_CAPACITY,
            });
        }

        if self.registry_capacity == 0 || self.registry_capacity > MAX_TABLE_CAPACITY {
            return Err(ConfigError::InvalidCapacity {
                table: "registry",
                value: self.registry_capacity,
                max: MAX_TABLE_CAPACITY,
            });
        }

        if self.max_connections_per_ip < MIN_CONNECTION_THRESHOLD
            || self.max_connections_per_ip > MAX_CONNECTION_THRESHOLD
        {
            return Err(ConfigError::InvalidThreshold {
                value: self.max_connections_per_ip,
                min: MIN_CONNECTION_THRESHOLD,
                max: MAX_CONNECTION_THRESHOLD,
            });
        }

        if self.ban_duration_secs < MIN_BAN_DURATION_SECS
            || self.ban_duration_secs > MAX_BAN_DURATION_SECS
        {
            return Err(ConfigError::InvalidBanDuration {
                value: self.ban_duration_secs,
                min: MIN_BAN_DURATION_SECS,
                max: MAX_BAN_DURATION_SECS,
            });
        }

        self.protected_ports.validate()
    }
}
