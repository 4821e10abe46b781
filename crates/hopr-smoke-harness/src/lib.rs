//! HOPR Smoke Harness - Cluster fixture and probes for smoke tests
//!
//! This crate drives the local 7 node cluster used by the smoke and stress
//! suites:
//!
//! - **Fixture**: sets the cluster up through the bootstrap script and
//!   guarantees teardown
//! - **Script**: the `ClusterScript` seam and its subprocess implementation
//! - **Probe**: TCP reachability checks for node ports
//!
//! # Example
//!
//! ```rust,no_run
//! use hopr_smoke_harness::{smoke_module, ClusterFixture};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let peers = ClusterFixture::shared().run(&smoke_module!(), |nodes| {
//!         nodes.iter().map(|n| n.peer_id).collect::<Vec<_>>()
//!     })?;
//!     println!("cluster peers: {:?}", peers);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod fixture;
pub mod probe;
pub mod script;

// Re-exports
pub use error::{HarnessError, Phase, Result};
pub use fixture::{module_log_name, ClusterFixture, ClusterGuard, FixtureConfig};
pub use probe::{
    check_socket, check_socket_blocking, probe_cluster, wait_for_cluster, wait_for_socket,
    NodeReachability,
};
pub use script::{ClusterScript, ShellScript, CLEANUP_FLAG, DEFAULT_SCRIPT, SETUP_FLAG};

// Re-export the static cluster data
pub use hopr_smoke_core::{nodes, NodeConfig, StressConfig};
