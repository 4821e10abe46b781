//! TCP reachability probes for cluster nodes

use std::time::Duration;

use futures::future::join_all;
use hopr_smoke_core::{NodeConfig, LOCALHOST};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{HarnessError, Result};

/// Interval between connection attempts in [`wait_for_socket`]
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Try a single TCP connection to `address:port`.
///
/// Any failure (refused, unreachable, resolution error) yields `false`.
/// The connection is closed before returning.
///
/// Must be awaited inside a tokio runtime; synchronous callers use
/// [`check_socket_blocking`].
pub async fn check_socket(address: &str, port: u16) -> bool {
    match TcpStream::connect((address, port)).await {
        Ok(stream) => {
            drop(stream);
            true
        }
        Err(e) => {
            debug!("{}:{} not reachable: {}", address, port, e);
            false
        }
    }
}

/// Blocking form of [`check_socket`].
///
/// Drives the connect attempt on a throwaway current-thread runtime, so it
/// must not be called from within a tokio runtime.
pub fn check_socket_blocking(address: &str, port: u16) -> bool {
    match tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
    {
        Ok(runtime) => runtime.block_on(check_socket(address, port)),
        Err(e) => {
            warn!("Failed to start runtime for {}:{}: {}", address, port, e);
            false
        }
    }
}

/// Poll `address:port` until it accepts a connection or `deadline` passes
pub async fn wait_for_socket(address: &str, port: u16, deadline: Duration) -> Result<()> {
    timeout(deadline, async {
        while !check_socket(address, port).await {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
    .map_err(|_| HarnessError::Timeout {
        address: address.to_string(),
        port,
        waited: deadline,
    })
}

/// Reachability of one node's ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeReachability {
    pub id: &'static str,
    pub api_reachable: bool,
    pub p2p_reachable: bool,
}

impl NodeReachability {
    pub fn is_up(&self) -> bool {
        self.api_reachable && self.p2p_reachable
    }
}

/// Probe the API and p2p port of every node concurrently
pub async fn probe_cluster(nodes: &[NodeConfig]) -> Vec<NodeReachability> {
    join_all(nodes.iter().map(|node| async move {
        let (api_reachable, p2p_reachable) = futures::join!(
            check_socket(LOCALHOST, node.api_port),
            check_socket(LOCALHOST, node.p2p_port)
        );
        NodeReachability {
            id: node.id,
            api_reachable,
            p2p_reachable,
        }
    }))
    .await
}

/// Wait until every node's API port accepts connections
pub async fn wait_for_cluster(nodes: &[NodeConfig], deadline: Duration) -> Result<()> {
    for result in join_all(
        nodes
            .iter()
            .map(|node| wait_for_socket(LOCALHOST, node.api_port, deadline)),
    )
    .await
    {
        result?;
    }
    Ok(())
}
