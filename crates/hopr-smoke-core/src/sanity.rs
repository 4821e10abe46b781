//! Consistency checks over the topology table

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::SanityError;
use crate::topology::NodeConfig;

fn all_distinct<'a, T, F>(nodes: &'a [NodeConfig], field: F) -> bool
where
    T: Eq + Hash + 'a,
    F: Fn(&'a NodeConfig) -> T,
{
    nodes.iter().map(field).collect::<HashSet<_>>().len() == nodes.len()
}

/// Check that private keys, API ports and p2p ports are pairwise distinct
pub fn check_topology(nodes: &[NodeConfig]) -> Result<(), SanityError> {
    if !all_distinct(nodes, |n| n.private_key) {
        return Err(SanityError::DuplicatePrivateKeys);
    }
    if !all_distinct(nodes, |n| n.api_port) {
        return Err(SanityError::DuplicateApiPorts);
    }
    if !all_distinct(nodes, |n| n.p2p_port) {
        return Err(SanityError::DuplicateP2pPorts);
    }
    Ok(())
}

/// [`check_topology`] plus distinct peer ids and well formed keys and ids
pub fn check_topology_strict(nodes: &[NodeConfig]) -> Result<(), SanityError> {
    check_topology(nodes)?;

    if !all_distinct(nodes, |n| n.peer_id) {
        return Err(SanityError::DuplicatePeerIds);
    }

    for node in nodes {
        node.private_key_bytes()?;
        node.parsed_peer_id()?;
    }

    Ok(())
}
