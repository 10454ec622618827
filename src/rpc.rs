//! Node-to-node call surface.
//!
//! Every operation one node invokes on another goes through the [ChordNode]
//! trait, whether the callee lives in the same process or behind a wire.
//! Remote references are capability handles: a [NodeHandle] is all a node
//! ever holds of a peer, and a handle that can no longer reach its peer
//! answers every call with [Error::NodeUnreachable] — which is exactly how
//! a crashed peer presents, so callers need no second failure model.
//!
//! [LocalHandle] is the in-process implementation used for single-process
//! rings and tests. How calls are marshaled onto a real transport is not
//! this crate's concern; any stub implementing [ChordNode] slots in.

use std::sync::Arc;
use std::sync::Weak;

use async_trait::async_trait;
use bytes::Bytes;

use crate::dht::Finger;
use crate::dht::RingNode;
use crate::error::Error;
use crate::error::Result;
use crate::key::Key;
use crate::storage::Bucket;

/// A capability handle to some node on the ring.
pub type NodeHandle = Arc<dyn ChordNode + Send + Sync>;

/// The uniform node interface: routing, data operations, topology
/// introspection and the graceful-leave handoff.
#[async_trait]
pub trait ChordNode {
    /// The node's position on the ring. Constant for the node's lifetime,
    /// so handles answer it without a round trip.
    fn key(&self) -> Key;

    /// Liveness probe. Returns `Ok(())` iff the node is reachable.
    async fn ping(&self) -> Result<()>;

    /// Resolve the node responsible for `key`.
    async fn find_successor(&self, key: Key) -> Result<Finger>;

    /// Best known live node strictly between this node and `key`.
    async fn closest_preceding_node(&self, key: Key) -> Result<Finger>;

    /// Store `value` under the logical key `key`, forwarding to the owner
    /// if necessary. Returns the node that ultimately stored it.
    async fn put(&self, key: &str, value: Bytes) -> Result<Finger>;

    /// Fetch the value stored under `key`. Absence is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Local-only lookup of `key` within the bucket for `hash`; never
    /// forwards.
    async fn get_local(&self, key: &str, hash: Key) -> Result<Option<Bytes>>;

    /// Unconditionally place a whole pre-hashed bucket on its owner,
    /// forwarding if this node does not own `hash`. Used only between
    /// nodes during rebalancing and leave handoff.
    async fn move_bucket(&self, hash: Key, bucket: Bucket) -> Result<Finger>;

    /// Hint that `candidate` believes it is this node's predecessor.
    async fn notify(&self, candidate: Finger) -> Result<()>;

    /// This node's current predecessor, if known.
    async fn predecessor(&self) -> Result<Option<Finger>>;

    /// Snapshot of this node's successor window.
    async fn successor_list(&self) -> Result<Vec<Finger>>;

    /// Overwrite the predecessor pointer. Graceful-leave handoff only.
    async fn set_predecessor(&self, pred: Option<Finger>) -> Result<()>;

    /// Overwrite the immediate successor. Graceful-leave handoff only.
    async fn set_successor(&self, succ: Finger) -> Result<()>;
}

/// In-process handle over a [RingNode].
///
/// Holds the peer weakly: once the node is dropped, every call through the
/// handle fails with [Error::NodeUnreachable], the same observable behavior
/// as a crashed peer on a real transport.
#[derive(Clone)]
pub struct LocalHandle {
    key: Key,
    node: Weak<RingNode>,
}

impl LocalHandle {
    /// Create a handle to `node`.
    pub fn new(node: &Arc<RingNode>) -> Self {
        Self {
            key: node.key(),
            node: Arc::downgrade(node),
        }
    }

    pub(crate) fn from_weak(key: Key, node: Weak<RingNode>) -> Self {
        Self { key, node }
    }

    fn reach(&self) -> Result<Arc<RingNode>> {
        self.node.upgrade().ok_or(Error::NodeUnreachable)
    }
}

#[async_trait]
impl ChordNode for LocalHandle {
    fn key(&self) -> Key {
        self.key
    }

    async fn ping(&self) -> Result<()> {
        self.reach().map(|_| ())
    }

    async fn find_successor(&self, key: Key) -> Result<Finger> {
        self.reach()?.find_successor(key).await
    }

    async fn closest_preceding_node(&self, key: Key) -> Result<Finger> {
        self.reach()?.closest_preceding_node(key).await
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<Finger> {
        self.reach()?.put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.reach()?.get(key).await
    }

    async fn get_local(&self, key: &str, hash: Key) -> Result<Option<Bytes>> {
        self.reach()?.get_local(key, hash).await
    }

    async fn move_bucket(&self, hash: Key, bucket: Bucket) -> Result<Finger> {
        self.reach()?.move_bucket(hash, bucket).await
    }

    async fn notify(&self, candidate: Finger) -> Result<()> {
        self.reach()?.notify(candidate).await
    }

    async fn predecessor(&self) -> Result<Option<Finger>> {
        self.reach()?.predecessor().await
    }

    async fn successor_list(&self) -> Result<Vec<Finger>> {
        self.reach()?.successor_list().await
    }

    async fn set_predecessor(&self, pred: Option<Finger>) -> Result<()> {
        self.reach()?.set_predecessor(pred).await
    }

    async fn set_successor(&self, succ: Finger) -> Result<()> {
        self.reach()?.set_successor(succ).await
    }
}
