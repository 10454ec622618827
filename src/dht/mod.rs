//! The Chord overlay: ring membership, finger routing, stabilization and
//! key-range data migration.
//! Based on CHORD, ref: <https://pdos.csail.mit.edu/papers/ton:chord/paper-ton.pdf>
//! With high probability, a lookup in an N-node ring contacts O(log N) nodes.

mod finger;
mod node;
mod stabilization;
mod successor;

pub use finger::Finger;
pub use finger::FingerTable;
pub use node::RingNode;
pub use stabilization::Stabilizer;
pub use successor::SuccessorWindow;
