//! Ringstore is a Chord distributed hash table.
//!
//! Nodes hash their names onto a modular ring and cooperatively own a
//! partition of it: each node is responsible for the half-open key range
//! between its predecessor and itself. Lookups route through per-node
//! finger tables in O(log N) expected hops, a successor window covers the
//! immediate successor failing, and a periodic maintenance cycle converges
//! ring topology and data placement through joins, leaves and crashes.
//!
//! The [dht] module is the protocol core. The node-to-node call surface is
//! the [rpc::ChordNode] trait; peers are held as capability handles, so an
//! in-process ring and a wire transport use identical code paths. The
//! [worker] module composes a node with a task-processing loop that
//! consumes the ring exclusively through put/get.

pub mod consts;
pub mod dht;
pub mod error;
pub mod key;
pub mod rpc;
pub mod storage;
pub mod worker;

#[cfg(test)]
mod tests;

pub use dht::Finger;
pub use dht::FingerTable;
pub use dht::RingNode;
pub use dht::Stabilizer;
pub use dht::SuccessorWindow;
pub use error::Error;
pub use error::Result;
pub use key::Key;
pub use rpc::ChordNode;
pub use rpc::LocalHandle;
pub use rpc::NodeHandle;
pub use storage::Bucket;
pub use storage::DataStore;
pub use worker::Task;
pub use worker::TaskKind;
pub use worker::WorkerNode;
