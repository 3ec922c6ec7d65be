//! In-process `CompletionNotifier`.
//!
//! Maps each query's registry key to the one-shot sender of its single waiter
//! and fans progress events out over a broadcast channel.

use async_trait::async_trait;
use recgather_core::fragment::CorrelationKey;
use recgather_core::notifier::{CompletionNotifier, PendingResult};
use recgather_core::record::{ProgressEvent, RecordInfo};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, oneshot};

const PROGRESS_CAPACITY: usize = 256;

/// Registry of callers blocked on a record query.
#[derive(Clone)]
pub struct PendingQueryRegistry {
    /// Prepended to `<device_id><sn>` to form registry keys
    key_prefix: String,
    waiters: Arc<Mutex<HashMap<String, oneshot::Sender<RecordInfo>>>>,
    progress: broadcast::Sender<ProgressEvent>,
}

impl PendingQueryRegistry {
    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `key_prefix` - Namespace for registry keys, e.g. `CALLBACK_CMD_RECORDINFO:`
    pub fn new(key_prefix: impl Into<String>) -> Self {
        let (progress, _) = broadcast::channel(PROGRESS_CAPACITY);
        Self {
            key_prefix: key_prefix.into(),
            waiters: Arc::new(Mutex::new(HashMap::new())),
            progress,
        }
    }

    /// Subscribes to progress events published from now on.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    /// Number of registered waiters that are still listening.
    pub async fn waiting(&self) -> usize {
        let waiters = self.waiters.lock().await;
        waiters.values().filter(|tx| !tx.is_closed()).count()
    }

    fn registry_key(&self, key: &CorrelationKey) -> String {
        key.with_prefix(&self.key_prefix)
    }
}

#[async_trait]
impl CompletionNotifier for PendingQueryRegistry {
    async fn register_waiter(&self, key: &CorrelationKey) -> PendingResult {
        let registry_key = self.registry_key(key);
        let (tx, rx) = oneshot::channel();

        let mut waiters = self.waiters.lock().await;
        // Waiters that timed out dropped their receiver; forget them.
        waiters.retain(|_, sender| !sender.is_closed());
        if waiters.insert(registry_key.clone(), tx).is_some() {
            tracing::warn!(
                "[PendingQueryRegistry] Replaced existing waiter for {}",
                registry_key
            );
        }

        PendingResult::new(registry_key, rx)
    }

    async fn release_once(&self, key: &CorrelationKey, result: RecordInfo) -> bool {
        let registry_key = self.registry_key(key);
        let sender = {
            let mut waiters = self.waiters.lock().await;
            waiters.remove(&registry_key)
        };

        match sender {
            Some(tx) => match tx.send(result) {
                Ok(()) => {
                    tracing::debug!("[PendingQueryRegistry] Released {}", registry_key);
                    true
                }
                Err(_) => {
                    tracing::debug!(
                        "[PendingQueryRegistry] Waiter for {} stopped waiting, dropping result",
                        registry_key
                    );
                    false
                }
            },
            None => {
                tracing::debug!(
                    "[PendingQueryRegistry] No waiter for {}, dropping result",
                    registry_key
                );
                false
            }
        }
    }

    async fn publish_progress(&self, event: ProgressEvent) {
        // No subscribers is fine
        let _ = self.progress.send(event);
    }
}
