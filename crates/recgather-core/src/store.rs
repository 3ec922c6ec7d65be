//! Fragment store contract.
//!
//! Aggregation state lives entirely in a shared keyed store so that fragments
//! of one query can be processed by any worker, on any node, without an
//! in-process lock. Each session owns three keys, see [`SessionKeys`].

use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::fragment::CorrelationKey;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// The four primitives the aggregator needs from a keyed store.
///
/// Any store offering merge-insert into a hash, atomic counters and per-key
/// expiry satisfies it. Keys that have expired must behave as if they were
/// never written.
///
/// # Implementation Notes
///
/// - `merge_into` and `increment_by` must be atomic per key under concurrent
///   callers; the aggregator relies on nothing else for correctness.
/// - Using a counter key as a set key (or the reverse) is a `Store` error.
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Merges `entries` into the hash at `set_key`, creating it if needed.
    ///
    /// Fields already present keep their stored value (first write wins).
    async fn merge_into(&self, set_key: &str, entries: HashMap<String, String>) -> Result<()>;

    /// Resets the remaining time-to-live of `key` to `ttl`.
    ///
    /// A missing key is left alone.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    /// Atomically adds `delta` to the counter at `counter_key`, creating it at
    /// zero if needed.
    ///
    /// # Returns
    ///
    /// The counter value after the increment.
    async fn increment_by(&self, counter_key: &str, delta: u64) -> Result<u64>;

    /// Reads a snapshot of every field of the hash at `set_key`.
    ///
    /// A missing key yields an empty map.
    async fn read_all(&self, set_key: &str) -> Result<HashMap<String, String>>;
}

/// The store keys of one aggregation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    /// Counter of items received so far
    pub count_key: String,
    /// Hash of dedup key to serialized item
    pub set_key: String,
    /// Counter claimed by the one fragment that completes the session
    pub done_key: String,
}

impl SessionKeys {
    pub fn new(config: &AggregatorConfig, key: &CorrelationKey) -> Self {
        Self {
            count_key: key.with_prefix(&config.count_key_prefix),
            set_key: key.with_prefix(&config.set_key_prefix),
            done_key: key.with_prefix(&config.done_key_prefix),
        }
    }
}
