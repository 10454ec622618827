//! Multi-node ring tests and their shared helpers.

mod test_routing;
mod test_stabilization;

use std::sync::Arc;

use crate::dht::RingNode;
use crate::dht::Stabilizer;
use crate::key::Key;

/// A node pinned to an exact ring position.
pub fn keyed_node(name: &str, key: u64) -> Arc<RingNode> {
    RingNode::with_key(name, Key::new(key))
}

/// Run one maintenance cycle on `node`.
pub async fn tick(node: &Arc<RingNode>) {
    Stabilizer::new(node.clone()).run_cycle().await;
}

/// Run `rounds` maintenance cycles over every node in order.
pub async fn converge(nodes: &[Arc<RingNode>], rounds: usize) {
    for _ in 0..rounds {
        for node in nodes {
            tick(node).await;
        }
    }
}

/// Default round count that lets every finger entry and successor slot be
/// recomputed at least once with room to spare.
pub const CONVERGE_ROUNDS: usize = 12;

/// Build a converged ring out of nodes pinned at `keys`. Every node after
/// the first joins through the first one, mirroring how operators bootstrap
/// off a single known entry point.
pub async fn build_ring(keys: &[u64]) -> Vec<Arc<RingNode>> {
    let nodes: Vec<Arc<RingNode>> = keys
        .iter()
        .map(|key| keyed_node(&format!("node-{key}"), *key))
        .collect();
    let entry = nodes[0].self_finger();
    for node in &nodes[1..] {
        node.join(&entry).await.expect("join through entry node");
    }
    converge(&nodes, CONVERGE_ROUNDS).await;
    nodes
}

/// The node that owns `key` by brute force over the pinned positions.
pub fn expected_owner(keys: &[u64], probe: u64) -> u64 {
    let mut sorted = keys.to_vec();
    sorted.sort_unstable();
    for candidate in &sorted {
        if probe <= *candidate {
            return *candidate;
        }
    }
    sorted[0]
}
