//! Completion notifier contract.
//!
//! The request-handling layer registers a waiter for a query before the query
//! is sent; the aggregator later releases that waiter with the assembled
//! [`RecordInfo`] and reports partial progress after every fragment.

use crate::error::{RecgatherError, Result};
use crate::fragment::CorrelationKey;
use crate::record::{ProgressEvent, RecordInfo};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::oneshot;

/// Delivers aggregation results to waiters and progress observers.
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    /// Registers the single waiter for `key`.
    ///
    /// Registering again for the same key replaces the previous waiter, whose
    /// [`PendingResult`] then resolves to `WaiterClosed`.
    async fn register_waiter(&self, key: &CorrelationKey) -> PendingResult;

    /// Resolves the waiter registered under `key`, at most once.
    ///
    /// No registered waiter (never registered, already released, or gone
    /// because it timed out) is a normal case and a silent no-op.
    ///
    /// # Returns
    ///
    /// `true` if a waiter received the result.
    async fn release_once(&self, key: &CorrelationKey, result: RecordInfo) -> bool;

    /// Broadcasts partial progress. Best effort, no waiter semantics.
    async fn publish_progress(&self, event: ProgressEvent);
}

/// The waiting side of a registered query.
#[derive(Debug)]
pub struct PendingResult {
    key: String,
    receiver: oneshot::Receiver<RecordInfo>,
}

impl PendingResult {
    pub fn new(key: impl Into<String>, receiver: oneshot::Receiver<RecordInfo>) -> Self {
        Self {
            key: key.into(),
            receiver,
        }
    }

    /// The registry key this waiter was registered under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Waits for the result for at most `timeout`.
    ///
    /// On timeout the receiver is dropped, so a release arriving later finds a
    /// closed slot and does nothing.
    ///
    /// # Errors
    ///
    /// - `Timeout` if nothing arrived in time
    /// - `WaiterClosed` if the registry dropped this waiter
    pub async fn wait(self, timeout: Duration) -> Result<RecordInfo> {
        let Self { key, receiver } = self;
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(RecgatherError::WaiterClosed { key }),
            Err(_) => {
                tracing::debug!("[PendingResult] Gave up waiting on {}", key);
                Err(RecgatherError::Timeout { key })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> RecordInfo {
        RecordInfo {
            device_id: "dev".to_string(),
            channel_id: "chan".to_string(),
            sn: "1".to_string(),
            name: None,
            sum_num: 0,
            count: 0,
            record_list: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_wait_receives_result() {
        let (tx, rx) = oneshot::channel();
        let pending = PendingResult::new("k", rx);
        tx.send(info()).unwrap();

        let result = pending.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(result, info());
    }

    #[tokio::test]
    async fn test_wait_reports_closed_sender() {
        let (tx, rx) = oneshot::channel::<RecordInfo>();
        let pending = PendingResult::new("k", rx);
        drop(tx);

        let err = pending.wait(Duration::from_secs(1)).await.unwrap_err();
        assert_eq!(err, RecgatherError::WaiterClosed { key: "k".to_string() });
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_and_closes_slot() {
        let (tx, rx) = oneshot::channel::<RecordInfo>();
        let pending = PendingResult::new("k", rx);

        let err = pending.wait(Duration::from_secs(5)).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(tx.is_closed());
        assert!(tx.send(info()).is_err());
    }
}
