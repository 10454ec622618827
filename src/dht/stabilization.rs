//! Stabilization runs a daemon to maintain the ring.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::dht::RingNode;

/// The maintenance runner for one node.
///
/// Each cycle performs the corrective passes in a fixed order. The passes
/// are independent: one failing (a dead peer mid-probe, a routing deadline)
/// must not keep the others from running, so every pass is isolated and its
/// failure only logged.
#[derive(Clone)]
pub struct Stabilizer {
    node: Arc<RingNode>,
}

impl Stabilizer {
    /// Create a maintenance runner for `node`.
    pub fn new(node: Arc<RingNode>) -> Self {
        Self { node }
    }

    /// Run one maintenance cycle.
    pub async fn run_cycle(&self) {
        if let Err(error) = self.node.stabilize().await {
            tracing::error!(node = %self.node.key(), %error, "stabilize failed");
        }
        if let Err(error) = self.node.fix_fingers().await {
            tracing::error!(node = %self.node.key(), %error, "fix_fingers failed");
        }
        if let Err(error) = self.node.check_predecessor().await {
            tracing::error!(node = %self.node.key(), %error, "check_predecessor failed");
        }
        if let Err(error) = self.node.maintain_successor_list().await {
            tracing::error!(node = %self.node.key(), %error, "maintain_successor_list failed");
        }
        if let Err(error) = self.node.check_successor_status().await {
            tracing::error!(node = %self.node.key(), %error, "check_successor_status failed");
        }
        if let Err(error) = self.node.rebalance().await {
            tracing::error!(node = %self.node.key(), %error, "rebalance failed");
        }
    }

    /// Run maintenance cycles forever on the given cadence.
    pub async fn wait(self, interval: Duration) {
        loop {
            sleep(interval).await;
            self.run_cycle().await;
        }
    }

    /// Spawn the maintenance loop onto the runtime. Abort the handle to
    /// stop maintaining, e.g. after [RingNode::leave].
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(self.wait(interval))
    }
}
