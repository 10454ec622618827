//! Chord node implementation.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::Weak;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio::time::timeout;

use crate::consts::JOIN_SETTLE_DELAY;
use crate::consts::LOOKUP_DEADLINE;
use crate::consts::PING_TIMEOUT;
use crate::dht::Finger;
use crate::dht::FingerTable;
use crate::dht::SuccessorWindow;
use crate::error::Error;
use crate::error::Result;
use crate::key::Key;
use crate::rpc::ChordNode;
use crate::rpc::LocalHandle;
use crate::rpc::NodeHandle;
use crate::storage::Bucket;
use crate::storage::DataStore;

/// One participant of the ring.
///
/// A node owns the half-open key range between its predecessor and itself,
/// routes lookups through its finger table, and keeps a successor window as
/// failover material. It is born unjoined: every routing entry points at
/// itself, it is immediately stable, and it trivially owns the whole ring
/// until [RingNode::join] places it into a real one.
///
/// The maintenance passes live here as well; a [Stabilizer] drives them on a
/// fixed cadence and isolates their failures from each other.
///
/// [Stabilizer]: crate::dht::Stabilizer
pub struct RingNode {
    name: String,
    key: Key,
    finger: Mutex<FingerTable>,
    successors: Mutex<SuccessorWindow>,
    predecessor: Mutex<Option<Finger>>,
    store: DataStore,
    stable_tx: watch::Sender<bool>,
    stable_rx: watch::Receiver<bool>,
    this: Weak<RingNode>,
}

impl RingNode {
    /// Create an unjoined node whose ring position is derived from `name`.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        let key = Key::hash_of(&name);
        Self::build(name, key)
    }

    /// Test constructor pinning the ring position directly.
    #[cfg(test)]
    pub(crate) fn with_key(name: impl Into<String>, key: Key) -> Arc<Self> {
        Self::build(name.into(), key)
    }

    fn build(name: String, key: Key) -> Arc<Self> {
        let (stable_tx, stable_rx) = watch::channel(true);
        Arc::new_cyclic(|this: &Weak<RingNode>| {
            let handle: NodeHandle = Arc::new(LocalHandle::from_weak(key, this.clone()));
            let myself = Finger::new(key, handle);
            tracing::info!(%name, %key, "created node");
            RingNode {
                finger: Mutex::new(FingerTable::new(key, myself.clone())),
                successors: Mutex::new(SuccessorWindow::new(myself)),
                predecessor: Mutex::new(None),
                store: DataStore::new(),
                stable_tx,
                stable_rx,
                this: this.clone(),
                name,
                key,
            }
        })
    }

    /// The name this node derives its key from. Logging only.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This node's position on the ring.
    pub fn key(&self) -> Key {
        self.key
    }

    /// This node's local bucket store.
    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Whether the node currently accepts puts.
    pub fn is_stable(&self) -> bool {
        *self.stable_rx.borrow()
    }

    #[cfg(test)]
    pub(crate) fn set_stable(&self, stable: bool) {
        self.stable_tx.send_replace(stable);
    }

    /// A finger referencing this node itself.
    pub fn self_finger(&self) -> Finger {
        let handle: NodeHandle = Arc::new(LocalHandle::from_weak(self.key, self.this.clone()));
        Finger::new(self.key, handle)
    }

    /// Lock and return MutexGuard of the finger table.
    pub fn lock_finger(&self) -> Result<MutexGuard<FingerTable>> {
        self.finger.lock().map_err(|_| Error::StateLock)
    }

    /// Lock and return MutexGuard of the successor window.
    pub fn lock_successors(&self) -> Result<MutexGuard<SuccessorWindow>> {
        self.successors.lock().map_err(|_| Error::StateLock)
    }

    /// Lock and return MutexGuard of the predecessor pointer.
    pub fn lock_predecessor(&self) -> Result<MutexGuard<Option<Finger>>> {
        self.predecessor.lock().map_err(|_| Error::StateLock)
    }

    /// Probe a finger's node. Any failure, transport trouble included, is
    /// reported as not alive and never propagates.
    pub async fn is_alive(&self, finger: &Finger) -> bool {
        match timeout(PING_TIMEOUT, finger.node().ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(error)) => {
                tracing::debug!(node = %self.key, peer = %finger.key(), %error, "liveness probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(node = %self.key, peer = %finger.key(), "liveness probe timed out");
                false
            }
        }
    }

    /// The immediate successor, substituting the first live successor
    /// window entry when finger entry 0 stops answering. Every routing and
    /// stabilization path resolves the successor through here.
    pub async fn immediate_successor(&self) -> Result<Finger> {
        let head = self.lock_finger()?.successor().clone();
        if self.is_alive(&head).await {
            return Ok(head);
        }
        let candidates = self.lock_successors()?.list();
        for candidate in candidates {
            if self.is_alive(&candidate).await {
                return Ok(candidate);
            }
        }
        Ok(head)
    }

    /// Resolve the owner of `key` under the routing deadline.
    pub async fn locate_owner(&self, key: Key) -> Result<Finger> {
        match timeout(LOOKUP_DEADLINE, ChordNode::find_successor(self, key)).await {
            Ok(result) => result,
            Err(_) => Err(Error::LookupDeadline(key)),
        }
    }

    fn owns(&self, hash: Key) -> Result<bool> {
        Ok(match &*self.lock_predecessor()? {
            // No known predecessor: either unjoined or freshly joined.
            // Claim the whole ring until notify teaches us better.
            None => true,
            Some(pred) => hash.in_right_closed(pred.key(), self.key),
        })
    }

    async fn wait_until_stable(&self) -> Result<()> {
        let mut stable = self.stable_rx.clone();
        stable
            .wait_for(|ready| *ready)
            .await
            .map_err(|_| Error::ShuttingDown)?;
        Ok(())
    }

    /// Join the ring that `target` belongs to.
    ///
    /// Resolves this node's true successor through the target ring, seeds
    /// the whole finger table and successor window with it so no entry is
    /// ever unset, then holds puts off for the settle delay while the
    /// maintenance cycle wires the node in properly.
    pub async fn join(&self, target: &Finger) -> Result<()> {
        *self.lock_predecessor()? = None;
        let successor = target.node().find_successor(self.key).await?;
        tracing::info!(
            node = %self.key,
            via = %target.key(),
            successor = %successor.key(),
            "joining ring"
        );
        self.lock_finger()?.seed(successor.clone());
        self.lock_successors()?.seed(successor);
        self.settle().await;
        Ok(())
    }

    async fn settle(&self) {
        self.stable_tx.send_replace(false);
        sleep(JOIN_SETTLE_DELAY).await;
        self.stable_tx.send_replace(true);
    }

    /// Gracefully exit the ring: relink predecessor and successor to each
    /// other, then migrate every bucket to the successor. Assumes both
    /// neighbors are reachable; a crash is handled by the maintenance
    /// passes of the surviving nodes instead.
    pub async fn leave(&self) -> Result<()> {
        self.stable_tx.send_replace(false);
        let successor = self.immediate_successor().await?;
        if successor.key() == self.key {
            // Last node of its ring; nowhere to hand anything.
            return Ok(());
        }
        let predecessor = self.lock_predecessor()?.clone();
        successor.node().set_predecessor(predecessor.clone()).await?;
        if let Some(pred) = &predecessor {
            pred.node().set_successor(successor.clone()).await?;
        }
        tracing::info!(node = %self.key, successor = %successor.key(), "left ring, migrating data");
        self.hand_off(&successor, |_| true).await
    }

    /// Transfer every bucket selected by `should_move` to `target`,
    /// removing each only after its transfer returned. The store guard is
    /// held across the whole scan so concurrent puts cannot land in a
    /// bucket that is being shipped away.
    async fn hand_off<F>(&self, target: &Finger, should_move: F) -> Result<()>
    where F: Fn(&Key) -> bool {
        let mut store = self.store.lock().await;
        let outgoing: Vec<Key> = store.keys().filter(|hash| should_move(hash)).copied().collect();
        for hash in outgoing {
            if let Some(bucket) = store.get(&hash).cloned() {
                target.node().move_bucket(hash, bucket).await?;
                store.remove(&hash);
                tracing::debug!(node = %self.key, %hash, target = %target.key(), "moved bucket");
            }
        }
        Ok(())
    }

    /// Maintenance: verify the successor still believes this node is its
    /// predecessor, adopting anyone who slid in between, and notify the
    /// (possibly updated) successor of our existence.
    pub(crate) async fn stabilize(&self) -> Result<()> {
        let mut successor = self.immediate_successor().await?;
        if let Some(candidate) = successor.node().predecessor().await? {
            if candidate.key().in_open(self.key, successor.key()) {
                tracing::info!(node = %self.key, adopted = %candidate.key(), "adopted closer successor");
                self.lock_finger()?.set(0, candidate.clone());
                successor = candidate;
            }
        }
        successor.node().notify(self.self_finger()).await
    }

    /// Maintenance: recompute one finger table entry.
    pub(crate) async fn fix_fingers(&self) -> Result<()> {
        let (index, target) = self.lock_finger()?.advance_fix();
        let owner = self.locate_owner(target).await?;
        self.lock_finger()?.set(index, owner);
        Ok(())
    }

    /// Maintenance: drop the predecessor pointer when it stops answering,
    /// forcing rediscovery through notify.
    pub(crate) async fn check_predecessor(&self) -> Result<()> {
        let current = self.lock_predecessor()?.clone();
        if let Some(pred) = current {
            if !self.is_alive(&pred).await {
                let mut guard = self.lock_predecessor()?;
                if guard.as_ref().map(Finger::key) == Some(pred.key()) {
                    tracing::info!(node = %self.key, predecessor = %pred.key(), "cleared unresponsive predecessor");
                    *guard = None;
                }
            }
        }
        Ok(())
    }

    /// Maintenance: recompute one successor window slot. Slot 0 chains off
    /// the immediate successor, every later slot off the one before it, so
    /// the window stays a connected run of ring neighbors.
    pub(crate) async fn maintain_successor_list(&self) -> Result<()> {
        let slot = self.lock_successors()?.advance_check();
        let base = if slot == 0 {
            self.lock_finger()?.successor().clone()
        } else {
            self.lock_successors()?.get(slot - 1).clone()
        };
        let next = self.locate_owner(base.key() + 1).await?;
        self.lock_successors()?.set(slot, next);
        Ok(())
    }

    /// Maintenance: when finger entry 0 is dead, promote the successor
    /// window head into it and shift the window left. Full repair is left
    /// to the next fix-fingers and window passes.
    pub(crate) async fn check_successor_status(&self) -> Result<()> {
        let head = self.lock_finger()?.successor().clone();
        if self.is_alive(&head).await {
            return Ok(());
        }
        let promoted = self.lock_successors()?.promote_head();
        tracing::info!(
            node = %self.key,
            failed = %head.key(),
            promoted = %promoted.key(),
            "immediate successor unreachable, promoted from successor window"
        );
        self.lock_finger()?.set(0, promoted);
        Ok(())
    }

    /// Maintenance: hand every bucket outside `(predecessor, self]` down to
    /// the predecessor. This is how data placement tracks topology changes;
    /// it runs on every tick a predecessor is known, trading redundant
    /// checks for never missing a handoff.
    pub(crate) async fn rebalance(&self) -> Result<()> {
        let predecessor = match self.lock_predecessor()?.clone() {
            Some(pred) if pred.key() != self.key => pred,
            _ => return Ok(()),
        };
        let pred_key = predecessor.key();
        let me = self.key;
        self.hand_off(&predecessor, move |hash| {
            !hash.in_right_closed(pred_key, me)
        })
        .await
    }
}

#[async_trait]
impl ChordNode for RingNode {
    fn key(&self) -> Key {
        self.key
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_successor(&self, key: Key) -> Result<Finger> {
        let successor = self.immediate_successor().await?;
        if key.in_right_closed(self.key, successor.key()) {
            tracing::debug!(node = %self.key, %key, owner = %successor.key(), "resolved successor");
            return Ok(successor);
        }
        let hop = self.closest_preceding_node(key).await?;
        if hop.key() == self.key {
            // No finger precedes the key; let the successor carry on.
            return successor.node().find_successor(key).await;
        }
        hop.node().find_successor(key).await
    }

    async fn closest_preceding_node(&self, key: Key) -> Result<Finger> {
        let entries = self.lock_finger()?.list().to_vec();
        for finger in entries.iter().rev() {
            if finger.key().in_open(self.key, key) && self.is_alive(finger).await {
                return Ok(finger.clone());
            }
        }
        Ok(self.self_finger())
    }

    async fn put(&self, key: &str, value: Bytes) -> Result<Finger> {
        self.wait_until_stable().await?;
        let hash = Key::hash_of(key);
        if self.owns(hash)? {
            self.store.upsert(hash, key, value).await;
            tracing::debug!(node = %self.key, %key, %hash, "stored value");
            return Ok(self.self_finger());
        }
        let owner = self.locate_owner(hash).await?;
        if owner.key() == self.key {
            // Routing disagrees with our stale predecessor; trust routing
            // rather than forwarding to ourselves forever.
            self.store.upsert(hash, key, value).await;
            return Ok(self.self_finger());
        }
        owner.node().put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let hash = Key::hash_of(key);
        if let Some(value) = self.store.fetch(hash, key).await {
            return Ok(Some(value));
        }
        let owner = self.locate_owner(hash).await?;
        if owner.key() == self.key {
            return Ok(None);
        }
        owner.node().get_local(key, hash).await
    }

    async fn get_local(&self, key: &str, hash: Key) -> Result<Option<Bytes>> {
        Ok(self.store.fetch(hash, key).await)
    }

    async fn move_bucket(&self, hash: Key, bucket: Bucket) -> Result<Finger> {
        self.wait_until_stable().await?;
        if self.owns(hash)? {
            tracing::debug!(node = %self.key, %hash, entries = bucket.len(), "accepted bucket");
            self.store.insert_bucket(hash, bucket).await;
            return Ok(self.self_finger());
        }
        let owner = self.locate_owner(hash).await?;
        if owner.key() == self.key {
            self.store.insert_bucket(hash, bucket).await;
            return Ok(self.self_finger());
        }
        owner.node().move_bucket(hash, bucket).await
    }

    async fn notify(&self, candidate: Finger) -> Result<()> {
        let mut predecessor = self.lock_predecessor()?;
        let accept = match &*predecessor {
            None => true,
            Some(current) => candidate.key().in_open(current.key(), self.key),
        };
        if accept {
            tracing::debug!(node = %self.key, predecessor = %candidate.key(), "accepted predecessor candidate");
            *predecessor = Some(candidate);
        }
        Ok(())
    }

    async fn predecessor(&self) -> Result<Option<Finger>> {
        Ok(self.lock_predecessor()?.clone())
    }

    async fn successor_list(&self) -> Result<Vec<Finger>> {
        Ok(self.lock_successors()?.list())
    }

    async fn set_predecessor(&self, pred: Option<Finger>) -> Result<()> {
        *self.lock_predecessor()? = pred;
        Ok(())
    }

    async fn set_successor(&self, succ: Finger) -> Result<()> {
        self.lock_finger()?.set(0, succ);
        Ok(())
    }
}
