//! HOPR Smoke Core - Static data for the local smoke test cluster
//!
//! This crate holds everything about the 7 node test cluster that does not
//! touch the network or the filesystem.
//!
//! # Modules
//!
//! - [`topology`] - Fixed node identities, ports and keys
//! - [`config`] - Stress test flags and their resolution
//! - [`sanity`] - Uniqueness checks over the topology
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust
//! use hopr_smoke_core::{nodes, sanity::check_topology, StressConfig};
//!
//! check_topology(nodes()).expect("topology is consistent");
//!
//! let config = StressConfig::resolve(["--stress-minimum-peer-count=5"]).unwrap();
//! assert_eq!(config.stress_minimum_peer_count, 5);
//! ```

pub mod config;
pub mod error;
pub mod sanity;
pub mod topology;

// Re-exports for convenience
pub use config::{StressArgs, StressConfig};
pub use error::{Result, SanityError, TopologyError};
pub use sanity::{check_topology, check_topology_strict};
pub use topology::{
    node, nodes, require_node, NodeConfig, DEFAULT_API_TOKEN, LOCALHOST, NODE_COUNT, PASSWORD,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
