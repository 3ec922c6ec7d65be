//! Fragment aggregation use case.
//!
//! `FragmentAggregator` folds the reply fragments of one record query into the
//! shared fragment store and, once the device's declared total is reached,
//! releases the query's waiter with every item in chronological order.
//!
//! The aggregator holds no per-session state of its own. Fragments of the same
//! query may be ingested concurrently by different workers; the store's atomic
//! merge and increment are the only synchronization.

use recgather_core::config::AggregatorConfig;
use recgather_core::error::Result;
use recgather_core::fragment::{CorrelationKey, Fragment};
use recgather_core::notifier::CompletionNotifier;
use recgather_core::record::{ProgressEvent, RecordInfo, RecordItem};
use recgather_core::store::{FragmentStore, SessionKeys};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

/// Accumulates record query fragments and releases completed queries.
///
/// # Responsibilities
///
/// - Merging each fragment's items into the session's item set, deduplicated
///   by time span, first write wins
/// - Counting received items and refreshing the aggregation window
/// - Publishing progress after every fragment
/// - Claiming completion once the running count reaches the declared total,
///   then assembling, sorting and releasing the result exactly once
pub struct FragmentAggregator {
    store: Arc<dyn FragmentStore>,
    notifier: Arc<dyn CompletionNotifier>,
    config: AggregatorConfig,
}

impl FragmentAggregator {
    /// Creates a new `FragmentAggregator`.
    ///
    /// # Arguments
    ///
    /// * `store` - Shared store holding session counters and item sets
    /// * `notifier` - Releases waiters and publishes progress
    /// * `config` - Aggregation window and store key prefixes
    pub fn new(
        store: Arc<dyn FragmentStore>,
        notifier: Arc<dyn CompletionNotifier>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Ingests one decoded fragment.
    ///
    /// Never fails: a store error is logged and the fragment is dropped. If the
    /// dropped fragment was the one that would have completed its session, the
    /// session is left to expire and its waiter times out on its own.
    pub async fn ingest(&self, fragment: Fragment) {
        let key = fragment.key.clone();
        if let Err(e) = self.try_ingest(fragment).await {
            tracing::error!("[RecordInfo] Dropped fragment for {}: {}", key, e);
        }
    }

    async fn try_ingest(&self, fragment: Fragment) -> Result<()> {
        if fragment.is_empty_reply() {
            return self.complete_empty(fragment).await;
        }

        let keys = SessionKeys::new(&self.config, &fragment.key);
        let ttl = self.config.ttl();

        let entries = dedup_entries(&fragment.items)?;
        self.store.merge_into(&keys.set_key, entries).await?;
        self.store.expire(&keys.set_key, ttl).await?;

        // Counted before dedup and before dropping owner-less items.
        let delta = fragment.items.len() as u64;
        let running = self.store.increment_by(&keys.count_key, delta).await?;
        self.store.expire(&keys.count_key, ttl).await?;

        tracing::debug!(
            "[RecordInfo] {} received {} items, {}/{}",
            fragment.key,
            delta,
            running,
            fragment.declared_total
        );

        let Fragment {
            key,
            channel_id,
            name,
            declared_total,
            items,
            ..
        } = fragment;

        self.notifier
            .publish_progress(ProgressEvent {
                device_id: key.device_id.clone(),
                channel_id: channel_id.clone(),
                sn: key.sn.clone(),
                name: name.clone(),
                sum_num: declared_total,
                delta_count: delta,
                running_count: running,
                items,
            })
            .await;

        if running < u64::from(declared_total) {
            return Ok(());
        }
        // Every fragment at or past the total competes for the done counter;
        // only the first to claim it completes the session.
        let claim = self.store.increment_by(&keys.done_key, 1).await?;
        self.store.expire(&keys.done_key, ttl).await?;
        if claim > 1 {
            tracing::debug!(
                "[RecordInfo] {} already complete, ignoring late fragment",
                key
            );
            return Ok(());
        }

        let stored = self.store.read_all(&keys.set_key).await?;
        let mut record_list = Vec::with_capacity(stored.len());
        for json in stored.into_values() {
            record_list.push(serde_json::from_str::<RecordItem>(&json)?);
        }

        self.release(RecordInfo {
            device_id: key.device_id,
            channel_id,
            sn: key.sn,
            name,
            sum_num: declared_total,
            count: running,
            record_list,
        })
        .await;
        Ok(())
    }

    /// Completes a session whose device reported no recordings.
    ///
    /// The reported count echoes the declared total.
    async fn complete_empty(&self, fragment: Fragment) -> Result<()> {
        tracing::info!("[RecordInfo] No recordings for {}", fragment.key);

        let Fragment {
            key,
            channel_id,
            name,
            declared_total,
            ..
        } = fragment;

        self.notifier
            .publish_progress(ProgressEvent {
                device_id: key.device_id.clone(),
                channel_id: channel_id.clone(),
                sn: key.sn.clone(),
                name: name.clone(),
                sum_num: declared_total,
                delta_count: 0,
                running_count: 0,
                items: Vec::new(),
            })
            .await;

        self.release(RecordInfo {
            device_id: key.device_id,
            channel_id,
            sn: key.sn,
            name,
            sum_num: declared_total,
            count: u64::from(declared_total),
            record_list: Vec::new(),
        })
        .await;
        Ok(())
    }

    async fn release(&self, mut info: RecordInfo) {
        info.sort_records();

        let key = CorrelationKey::new(&info.device_id, &info.sn);
        let items = info.record_list.len();
        let released = self.notifier.release_once(&key, info).await;

        tracing::info!(
            "[RecordInfo] {} complete with {} items (waiter released: {})",
            key,
            items,
            released
        );
    }
}

/// Builds the dedup map for one fragment: time span to serialized item.
///
/// Items without an owning device are left out. Within the fragment the first
/// item of a time span wins, as it does across fragments in the store.
fn dedup_entries(items: &[RecordItem]) -> Result<HashMap<String, String>> {
    let mut entries = HashMap::with_capacity(items.len());
    for item in items {
        if !item.has_owner() {
            tracing::warn!(
                "[RecordInfo] Record {} - {} has no owning device, skipping",
                item.start_time,
                item.end_time
            );
            continue;
        }
        if let Entry::Vacant(slot) = entries.entry(item.dedup_key()) {
            slot.insert(serde_json::to_string(item)?);
        }
    }
    Ok(entries)
}
