//! Collision container for one ring-hash slot.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Deserialize;
use serde::Serialize;

use crate::key::Key;

/// All logical entries whose string keys hash to the same ring slot.
///
/// Distinct strings are expected to collide on a small ring; they coexist
/// inside one bucket, while a repeated put of the same string overwrites its
/// previous value. Buckets travel whole between nodes during rebalancing,
/// so the type is serializable and never re-hashes its entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bucket {
    hash: Key,
    values: HashMap<String, Bytes>,
}

impl Bucket {
    /// An empty bucket for the given ring slot.
    pub fn new(hash: Key) -> Self {
        Self {
            hash,
            values: HashMap::new(),
        }
    }

    /// A bucket seeded with one entry.
    pub fn with_entry(hash: Key, key: impl Into<String>, value: Bytes) -> Self {
        let mut bucket = Self::new(hash);
        bucket.insert(key, value);
        bucket
    }

    /// The ring slot this bucket lives under.
    pub fn hash(&self) -> Key {
        self.hash
    }

    /// Add or overwrite the entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Bytes) -> Option<Bytes> {
        self.values.insert(key.into(), value)
    }

    /// Fetch the entry for `key`.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.values.get(key).cloned()
    }

    /// Number of logical entries in the bucket.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the bucket holds no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
