//! In-process `FragmentStore` with per-key expiry.
//!
//! Keeps counters and hashes in one map behind a lock. Expiry is lazy: every
//! primitive first drops its key if the deadline has passed, and
//! [`MemoryFragmentStore::purge_expired`] sweeps the rest. Deadlines use
//! `tokio::time::Instant`, so paused-clock tests can step through a window.

use async_trait::async_trait;
use recgather_core::error::{RecgatherError, Result};
use recgather_core::store::FragmentStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum StoredValue {
    Counter(u64),
    Hash(HashMap<String, String>),
}

impl StoredValue {
    fn kind(&self) -> &'static str {
        match self {
            StoredValue::Counter(_) => "counter",
            StoredValue::Hash(_) => "hash",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: StoredValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Fragment store living in the current process.
///
/// Cloning is cheap and clones share the same data, so one store can be handed
/// to every worker.
#[derive(Debug, Clone, Default)]
pub struct MemoryFragmentStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryFragmentStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time-to-live of `key`.
    ///
    /// # Returns
    ///
    /// `None` if the key is missing, expired, or has no deadline.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let entry = entries.get(key).filter(|e| !e.is_expired(now))?;
        entry.expires_at.map(|deadline| deadline - now)
    }

    /// Whether `key` holds a live value.
    pub async fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.get(key).is_some_and(|e| !e.is_expired(now))
    }

    /// Removes every expired key.
    ///
    /// # Returns
    ///
    /// The number of keys removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!("[MemoryFragmentStore] Purged {} expired keys", purged);
        }
        purged
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Drops `key` from `entries` if its deadline has passed.
fn evict_if_expired(entries: &mut HashMap<String, Entry>, key: &str, now: Instant) {
    if entries.get(key).is_some_and(|e| e.is_expired(now)) {
        entries.remove(key);
    }
}

fn wrong_kind(key: &str, expected: &str, found: &StoredValue) -> RecgatherError {
    RecgatherError::store(format!(
        "key '{}' holds a {}, expected a {}",
        key,
        found.kind(),
        expected
    ))
}

#[async_trait]
impl FragmentStore for MemoryFragmentStore {
    async fn merge_into(&self, set_key: &str, fields: HashMap<String, String>) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        evict_if_expired(&mut entries, set_key, now);

        let entry = entries.entry(set_key.to_string()).or_insert_with(|| Entry {
            value: StoredValue::Hash(HashMap::new()),
            expires_at: None,
        });

        match &mut entry.value {
            StoredValue::Hash(hash) => {
                for (field, value) in fields {
                    hash.entry(field).or_insert(value);
                }
                Ok(())
            }
            other => Err(wrong_kind(set_key, "hash", other)),
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        evict_if_expired(&mut entries, key, now);

        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(now + ttl);
        }
        Ok(())
    }

    async fn increment_by(&self, counter_key: &str, delta: u64) -> Result<u64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        evict_if_expired(&mut entries, counter_key, now);

        let entry = entries
            .entry(counter_key.to_string())
            .or_insert_with(|| Entry {
                value: StoredValue::Counter(0),
                expires_at: None,
            });

        match &mut entry.value {
            StoredValue::Counter(count) => {
                *count = count.checked_add(delta).ok_or_else(|| {
                    RecgatherError::store(format!("counter '{}' overflowed", counter_key))
                })?;
                Ok(*count)
            }
            other => Err(wrong_kind(counter_key, "counter", other)),
        }
    }

    async fn read_all(&self, set_key: &str) -> Result<HashMap<String, String>> {
        let now = Instant::now();
        let entries = self.entries.read().await;

        match entries.get(set_key).filter(|e| !e.is_expired(now)) {
            None => Ok(HashMap::new()),
            Some(Entry {
                value: StoredValue::Hash(hash),
                ..
            }) => Ok(hash.clone()),
            Some(Entry { value, .. }) => Err(wrong_kind(set_key, "hash", value)),
        }
    }
}
