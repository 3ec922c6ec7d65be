mod common;

use async_trait::async_trait;
use recgather_application::{Acknowledger, FragmentAggregator, RecordInfoHandler, WorkerPool};
use recgather_core::{
    AggregatorConfig, CompletionNotifier, CorrelationKey, RawFragment, RawRecordItem,
    RecgatherError, Result,
};
use recgather_infrastructure::{MemoryFragmentStore, PendingQueryRegistry};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Acknowledger that logs the SN of every packet it acknowledged.
#[derive(Default)]
struct RecordingAcknowledger {
    acked: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait]
impl Acknowledger for RecordingAcknowledger {
    async fn acknowledge(&self, raw: &RawFragment) -> Result<()> {
        self.acked
            .lock()
            .unwrap()
            .push(raw.sn.clone().unwrap_or_default());
        if self.fail {
            return Err(RecgatherError::internal("transaction already terminated"));
        }
        Ok(())
    }
}

fn raw_item(start: &str, end: &str) -> RawRecordItem {
    RawRecordItem {
        device_id: Some(common::CHANNEL.to_string()),
        name: Some("Gate camera".to_string()),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        record_type: Some("time".to_string()),
        ..Default::default()
    }
}

fn raw(sn: &str, sum_num: &str, items: Vec<RawRecordItem>) -> RawFragment {
    RawFragment {
        device: common::DEVICE.to_string(),
        channel_id: Some(common::CHANNEL.to_string()),
        sn: Some(sn.to_string()),
        name: Some("Gate camera".to_string()),
        sum_num: Some(sum_num.to_string()),
        record_list: Some(items),
    }
}

fn handler(
    acknowledger: Arc<RecordingAcknowledger>,
) -> (RecordInfoHandler, Arc<PendingQueryRegistry>) {
    let config = AggregatorConfig {
        worker_pool_size: 4,
        ..Default::default()
    };
    let registry = Arc::new(PendingQueryRegistry::new(config.waiter_key_prefix.clone()));
    let aggregator = Arc::new(FragmentAggregator::new(
        Arc::new(MemoryFragmentStore::new()),
        registry.clone(),
        config.clone(),
    ));
    let pool = WorkerPool::new(config.worker_pool_size);
    (
        RecordInfoHandler::new(aggregator, acknowledger, pool),
        registry,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fragments_flow_through_pool_to_waiter() {
    let acknowledger = Arc::new(RecordingAcknowledger::default());
    let (handler, registry) = handler(acknowledger.clone());
    let pending = registry
        .register_waiter(&CorrelationKey::new(common::DEVICE, "21"))
        .await;

    handler
        .handle(raw(
            "21",
            "3",
            vec![raw_item("2024-05-01T12:00:00", "2024-05-01T13:00:00")],
        ))
        .await;
    handler
        .handle(raw(
            "21",
            "3",
            vec![
                raw_item("2024-05-01T08:00:00", "2024-05-01T09:00:00"),
                raw_item("2024-05-01T10:00:00", "2024-05-01T11:00:00"),
            ],
        ))
        .await;

    let info = pending.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(info.count, 3);
    assert_eq!(info.channel_id, common::CHANNEL);
    assert_eq!(info.record_list[0].start_time, "2024-05-01 08:00:00");
    assert_eq!(info.record_list[2].end_time, "2024-05-01 13:00:00");

    assert_eq!(*acknowledger.acked.lock().unwrap(), vec!["21", "21"]);
    handler.shutdown().await;
}

#[tokio::test]
async fn test_malformed_fragment_is_acked_then_dropped() {
    let acknowledger = Arc::new(RecordingAcknowledger::default());
    let (handler, registry) = handler(acknowledger.clone());
    let pending = registry
        .register_waiter(&CorrelationKey::new(common::DEVICE, "22"))
        .await;

    handler.handle(raw("22", "two", Vec::new())).await;
    handler.shutdown().await;

    assert_eq!(*acknowledger.acked.lock().unwrap(), vec!["22"]);
    // Nothing completes the session, so the caller times out.
    let err = pending.wait(Duration::from_millis(50)).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(registry.waiting().await, 0);
}

#[tokio::test]
async fn test_failed_ack_still_aggregates() {
    let acknowledger = Arc::new(RecordingAcknowledger {
        fail: true,
        ..Default::default()
    });
    let (handler, registry) = handler(acknowledger);
    let pending = registry
        .register_waiter(&CorrelationKey::new(common::DEVICE, "23"))
        .await;

    handler.handle(raw("23", "0", Vec::new())).await;

    let info = pending.wait(Duration::from_secs(5)).await.unwrap();
    assert!(info.record_list.is_empty());
    handler.shutdown().await;
}

#[tokio::test]
async fn test_fragment_of_only_ownerless_entries_does_not_complete_empty() {
    let acknowledger = Arc::new(RecordingAcknowledger::default());
    let (handler, registry) = handler(acknowledger);
    let pending = registry
        .register_waiter(&CorrelationKey::new(common::DEVICE, "24"))
        .await;

    handler
        .handle(raw(
            "24",
            "4",
            vec![
                raw_item("2024-05-01T08:00:00", "2024-05-01T09:00:00"),
                raw_item("2024-05-01T10:00:00", "2024-05-01T11:00:00"),
            ],
        ))
        .await;
    let mut ownerless = raw_item("2024-05-01T12:00:00", "2024-05-01T13:00:00");
    ownerless.device_id = None;
    handler.handle(raw("24", "4", vec![ownerless])).await;
    handler.shutdown().await;

    // Three of four items arrived, so the session is still open.
    let err = pending.wait(Duration::from_millis(50)).await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_ownerless_entries_count_toward_completion() {
    let acknowledger = Arc::new(RecordingAcknowledger::default());
    let (handler, registry) = handler(acknowledger);
    let pending = registry
        .register_waiter(&CorrelationKey::new(common::DEVICE, "25"))
        .await;

    handler
        .handle(raw(
            "25",
            "3",
            vec![
                raw_item("2024-05-01T08:00:00", "2024-05-01T09:00:00"),
                raw_item("2024-05-01T10:00:00", "2024-05-01T11:00:00"),
            ],
        ))
        .await;
    let mut ownerless = raw_item("2024-05-01T12:00:00", "2024-05-01T13:00:00");
    ownerless.device_id = None;
    handler.handle(raw("25", "3", vec![ownerless])).await;

    let info = pending.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(info.count, 3);
    assert_eq!(info.record_list.len(), 2);
    assert_eq!(info.record_list[0].start_time, "2024-05-01 08:00:00");
    handler.shutdown().await;
}
