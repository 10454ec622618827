//! Error of ringstore.

use crate::key::Key;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors collections in ringstore.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Peer is unreachable")]
    NodeUnreachable,

    #[error("Lookup of key {0} exceeded the routing deadline")]
    LookupDeadline(Key),

    #[error("Node state lock poisoned")]
    StateLock,

    #[error("Node is shutting down")]
    ShuttingDown,

    #[error("No payload stored under key {0}")]
    TaskPayloadMissing(String),

    #[error("Payload encryption failed")]
    Encrypt,

    #[error("JSON serialization error")]
    Serialize(#[source] serde_json::Error),

    #[error("JSON deserialization error")]
    Deserialize(#[source] serde_json::Error),
}
