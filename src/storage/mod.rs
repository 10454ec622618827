//! Per-node data store.
//!
//! An ordered map from ring slot to [Bucket], guarded by an async mutex.
//! Single-bucket operations take the lock per call; the compound
//! scan-and-transfer flows (rebalancing, leave handoff) take the guard once
//! via [DataStore::lock] and hold it across their remote transfers, so a
//! concurrent put can never land in a bucket that is being shipped away.

mod bucket;

use std::collections::BTreeMap;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::sync::MutexGuard;

pub use bucket::Bucket;

use crate::key::Key;

/// Ordered store of buckets held by one node.
#[derive(Debug, Default)]
pub struct DataStore {
    inner: Mutex<BTreeMap<Key, Bucket>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` under `key` in the bucket for `hash`, creating the
    /// bucket if this is the slot's first entry.
    pub async fn upsert(&self, hash: Key, key: &str, value: Bytes) {
        let mut inner = self.inner.lock().await;
        inner
            .entry(hash)
            .or_insert_with(|| Bucket::new(hash))
            .insert(key, value);
    }

    /// Fetch the value for `key` out of the bucket for `hash`.
    pub async fn fetch(&self, hash: Key, key: &str) -> Option<Bytes> {
        let inner = self.inner.lock().await;
        inner.get(&hash).and_then(|bucket| bucket.get(key))
    }

    /// Place a whole bucket, replacing any bucket already in the slot.
    pub async fn insert_bucket(&self, hash: Key, bucket: Bucket) {
        let mut inner = self.inner.lock().await;
        inner.insert(hash, bucket);
    }

    /// Take the store guard for a compound scan.
    pub async fn lock(&self) -> MutexGuard<'_, BTreeMap<Key, Bucket>> {
        self.inner.lock().await
    }

    /// Whether a bucket exists for `hash`.
    pub async fn contains(&self, hash: Key) -> bool {
        self.inner.lock().await.contains_key(&hash)
    }

    /// Number of buckets currently held.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether the store holds no buckets.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
