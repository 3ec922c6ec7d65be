#![allow(dead_code)]

use async_trait::async_trait;
use recgather_core::{
    CompletionNotifier, CorrelationKey, Fragment, PendingResult, ProgressEvent, RecordInfo,
    RecordItem,
};
use std::sync::Mutex;
use tokio::sync::oneshot;

pub const DEVICE: &str = "34020000001110000001";
pub const CHANNEL: &str = "34020000001320000001";

/// A record spanning `start_hour:00` to `start_hour:59` on 2024-05-01.
pub fn record(start_hour: u32) -> RecordItem {
    record_span(
        &format!("2024-05-01 {:02}:00:00", start_hour),
        &format!("2024-05-01 {:02}:59:59", start_hour),
    )
}

pub fn record_span(start: &str, end: &str) -> RecordItem {
    RecordItem {
        device_id: CHANNEL.to_string(),
        name: Some("Gate camera".to_string()),
        file_path: Some(format!("/rec/{}.mp4", start)),
        file_size: Some("1048576".to_string()),
        address: Some("North gate".to_string()),
        start_time: start.to_string(),
        end_time: end.to_string(),
        secrecy: 0,
        record_type: Some("time".to_string()),
        recorder_id: None,
    }
}

pub fn fragment(sn: &str, declared_total: u32, items: Vec<RecordItem>) -> Fragment {
    Fragment {
        key: CorrelationKey::new(DEVICE, sn),
        channel_id: CHANNEL.to_string(),
        name: Some("Gate camera".to_string()),
        declared_total,
        has_record_list: true,
        items,
    }
}

/// Notifier that remembers every call.
#[derive(Default)]
pub struct RecordingNotifier {
    pub releases: Mutex<Vec<RecordInfo>>,
    pub progress: Mutex<Vec<ProgressEvent>>,
}

impl RecordingNotifier {
    pub fn releases(&self) -> Vec<RecordInfo> {
        self.releases.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<ProgressEvent> {
        self.progress.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionNotifier for RecordingNotifier {
    async fn register_waiter(&self, key: &CorrelationKey) -> PendingResult {
        let (_tx, rx) = oneshot::channel();
        PendingResult::new(key.to_string(), rx)
    }

    async fn release_once(&self, _key: &CorrelationKey, result: RecordInfo) -> bool {
        self.releases.lock().unwrap().push(result);
        true
    }

    async fn publish_progress(&self, event: ProgressEvent) {
        self.progress.lock().unwrap().push(event);
    }
}
