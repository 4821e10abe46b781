//! Static topology of the 7 node smoke test cluster
//!
//! Every node runs on loopback with a fixed p2p port (19091..19097) and
//! HTTP API port (13301..13307). The keys and peer ids are the ones the
//! local bootstrap script turns into real node identities.

use libp2p::{Multiaddr, PeerId};
use serde::Serialize;

use crate::error::{Result, TopologyError};

/// Loopback address every cluster node binds to
pub const LOCALHOST: &str = "127.0.0.1";

/// API token accepted by every node's REST API
pub const DEFAULT_API_TOKEN: &str = "e2e-API-token^^";

/// Password protecting the node identity files created by the bootstrap script
pub const PASSWORD: &str = "e2e-test";

/// Number of nodes in the cluster
pub const NODE_COUNT: usize = 7;

/// Network identity of a single cluster node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeConfig {
    /// Node identifier ("1".."7")
    pub id: &'static str,
    /// TCP port for peer-to-peer traffic
    pub p2p_port: u16,
    /// TCP port of the HTTP management API
    pub api_port: u16,
    /// Hex encoded, 0x prefixed private key
    pub private_key: &'static str,
    /// libp2p peer id of the node
    pub peer_id: &'static str,
}

static NODES: [NodeConfig; NODE_COUNT] = [
    NodeConfig {
        id: "1",
        p2p_port: 19091,
        api_port: 13301,
        private_key: "0x1f5b172a64947589be6e279fbcbc09aca6e623a64a92aa359fae9c6613b7e801",
        peer_id: "16Uiu2HAm2SxWfXGqFsem2cZVwPh56GgPrdaWsFk1ZPkLVZ5EWA3X",
    },
    NodeConfig {
        id: "2",
        p2p_port: 19092,
        api_port: 13302,
        private_key: "0xcb9c3533beb75b996b6c77150ecda32134d13710a16121f04dc591113329cd7c",
        peer_id: "16Uiu2HAkzBPGEw2sxS6dQrHXZ8TfQvpk7Tc2AfKs4uKGjQ2JDMrm",
    },
    NodeConfig {
        id: "3",
        p2p_port: 19093,
        api_port: 13303,
        private_key: "0x9a96a7711e2e9c9f71767bb9f248f699b29aebe7f590de8eeec0e71796b869e0",
        peer_id: "16Uiu2HAkzEnkW3xGJbvpXSXmvVR177LcR4Sw7z5S1ijuBcnbVFsV",
    },
    NodeConfig {
        id: "4",
        p2p_port: 19094,
        api_port: 13304,
        private_key: "0x7dea49b4dbeea4dcbbb9d071bc7212347748dc3a2f16896f504417236b6adb84",
        peer_id: "16Uiu2HAm3nRSB4rDdrvniV1X3myJ13H1xLZdVHDBbxFFfTtMthbD",
    },
    NodeConfig {
        id: "5",
        p2p_port: 19095,
        api_port: 13305,
        private_key: "0x800fee12d472c1a8448b786eb9e5d6c7f643c78b9727032893da9a6a55db288b",
        peer_id: "16Uiu2HAmVVcQUEHr1JzsBmyZkupWGxiwBtav6o5rfzKhKRUFVAD8",
    },
    NodeConfig {
        id: "6",
        p2p_port: 19096,
        api_port: 13306,
        private_key: "0x79b94be0c06dac87139c54416228dcacfb084c6884bbf4e48fff4cab8f40baa6",
        peer_id: "16Uiu2HAkxzXPsLwA5L7KaLK3NKrkkRqBYnZBP3Wv29A7q8m8QqQG",
    },
    NodeConfig {
        id: "7",
        p2p_port: 19097,
        api_port: 13307,
        private_key: "0x9b813edd8a85cffbe3cd2e242dc0992cfa04be15caa9f50b0b03b5ebcb2f770a",
        peer_id: "16Uiu2HAmHQJEHh9RD4fME6tyEDgyFZhNW2M4zR7sbpMkjJ6jGDbj",
    },
];

/// All cluster nodes in identifier order
pub fn nodes() -> &'static [NodeConfig] {
    &NODES
}

/// Look up a node by identifier
pub fn node(id: &str) -> Option<&'static NodeConfig> {
    NODES.iter().find(|n| n.id == id)
}

/// Look up a node by identifier, failing if it is not part of the cluster
pub fn require_node(id: &str) -> Result<&'static NodeConfig> {
    node(id).ok_or_else(|| TopologyError::UnknownNode(id.to_string()))
}

impl NodeConfig {
    /// Base URL of the node's REST API
    pub fn api_url(&self) -> String {
        format!("http://{}:{}", LOCALHOST, self.api_port)
    }

    /// Parse the peer id into a libp2p `PeerId`
    pub fn parsed_peer_id(&self) -> Result<PeerId> {
        self.peer_id
            .parse::<PeerId>()
            .map_err(|e| TopologyError::InvalidPeerId {
                node: self.id.to_string(),
                reason: e.to_string(),
            })
    }

    /// Dialable p2p address including the `/p2p/` component
    pub fn p2p_multiaddr(&self) -> Result<Multiaddr> {
        let peer_id = self.parsed_peer_id()?;
        let addr = format!("/ip4/{}/tcp/{}/p2p/{}", LOCALHOST, self.p2p_port, peer_id);
        addr.parse::<Multiaddr>().map_err(|e| TopologyError::InvalidMultiaddr {
            node: self.id.to_string(),
            reason: format!("{}: {}", addr, e),
        })
    }

    /// Decode the private key into raw bytes
    pub fn private_key_bytes(&self) -> Result<[u8; 32]> {
        let invalid = |reason: String| TopologyError::InvalidPrivateKey {
            node: self.id.to_string(),
            reason,
        };

        let hex_part = self
            .private_key
            .strip_prefix("0x")
            .ok_or_else(|| invalid("missing 0x prefix".to_string()))?;
        let bytes = hex::decode(hex_part).map_err(|e| invalid(e.to_string()))?;

        <[u8; 32]>::try_from(bytes)
            .map_err(|b| invalid(format!("expected 32 bytes, got {}", b.len())))
    }
}
