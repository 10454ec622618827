//! Finger table of the Chord ring.

use std::fmt;

use crate::consts::KEY_BITS;
use crate::key::Key;
use crate::rpc::NodeHandle;

/// An immutable pairing of a ring position and a handle to the node that
/// owned it when the finger was captured.
///
/// Fingers are routing back-references, never ownership: a stale finger is
/// expected and gets weeded out by liveness probes, not trusted blindly.
#[derive(Clone)]
pub struct Finger {
    key: Key,
    node: NodeHandle,
}

impl Finger {
    /// Pair `key` with `node`.
    pub fn new(key: Key, node: NodeHandle) -> Self {
        Self { key, node }
    }

    /// Snapshot a handle into a finger, capturing its key now.
    pub fn from_handle(node: NodeHandle) -> Self {
        Self {
            key: node.key(),
            node,
        }
    }

    /// The ring position captured at construction.
    pub fn key(&self) -> Key {
        self.key
    }

    /// The handle to the referenced node.
    pub fn node(&self) -> &NodeHandle {
        &self.node
    }
}

impl fmt::Debug for Finger {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Finger").field(&self.key).finish()
    }
}

/// Routing table with one entry per key bit.
///
/// Entry `i` should reference the node owning `(key + 2^i) mod 2^B`; entry 0
/// is the immediate successor. Every slot starts out self-referential and is
/// re-seeded wholesale on join, so no entry is ever unset. A rotating cursor
/// repairs one entry per maintenance tick.
#[derive(Debug)]
pub struct FingerTable {
    key: Key,
    entries: Vec<Finger>,
    fix_index: usize,
}

impl FingerTable {
    /// A table for the node at `key`, every entry pointing at `myself`.
    pub fn new(key: Key, myself: Finger) -> Self {
        let size = KEY_BITS as usize;
        Self {
            key,
            entries: vec![myself; size],
            // The rotating repair starts over at entry 0 on the first tick.
            fix_index: size - 1,
        }
    }

    /// Entry `index` of the table.
    pub fn get(&self, index: usize) -> &Finger {
        &self.entries[index]
    }

    /// The immediate successor, entry 0.
    pub fn successor(&self) -> &Finger {
        &self.entries[0]
    }

    /// Replace entry `index`.
    pub fn set(&mut self, index: usize, finger: Finger) {
        tracing::debug!(
            node = %self.key,
            index,
            entry = %finger.key(),
            "set finger table entry"
        );
        self.entries[index] = finger;
    }

    /// Point every entry at `successor`. Used right after join so that no
    /// slot refers to a ring the node just left.
    pub fn seed(&mut self, successor: Finger) {
        for entry in self.entries.iter_mut() {
            *entry = successor.clone();
        }
    }

    /// Advance the repair cursor and return the slot to fix together with
    /// the ring position whose owner belongs in it.
    pub fn advance_fix(&mut self) -> (usize, Key) {
        self.fix_index = (self.fix_index + 1) % self.entries.len();
        let target = self.key + (1u64 << self.fix_index);
        (self.fix_index, target)
    }

    /// All entries, nearest first.
    pub fn list(&self) -> &[Finger] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Tables are fixed-size; this mirrors `len` for completeness.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry keys, nearest first. Cheap topology snapshot for
    /// convergence checks and logging.
    pub fn keys(&self) -> Vec<Key> {
        self.entries.iter().map(Finger::key).collect()
    }
}
