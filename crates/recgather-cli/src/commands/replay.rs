use super::load_config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use recgather_application::{Acknowledger, FragmentAggregator, RecordInfoHandler, WorkerPool};
use recgather_core::{CompletionNotifier, CorrelationKey, RawFragment, RecordInfo};
use recgather_infrastructure::{MemoryFragmentStore, PendingQueryRegistry};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Replayed packets have no transport to answer; acknowledging only logs.
struct LogAcknowledger;

#[async_trait]
impl Acknowledger for LogAcknowledger {
    async fn acknowledge(&self, raw: &RawFragment) -> recgather_core::Result<()> {
        tracing::debug!(
            "[Replay] 200 OK to {} (SN {})",
            raw.device,
            raw.sn.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}

/// Reads a JSON array of raw fragments.
pub fn read_fragments(path: &Path) -> Result<Vec<RawFragment>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as a fragment list", path.display()))
}

/// Correlation keys of every query present in `fragments`, in a stable order.
pub fn query_keys(fragments: &[RawFragment]) -> Vec<CorrelationKey> {
    fragments
        .iter()
        .filter_map(|raw| {
            raw.sn
                .as_deref()
                .map(|sn| (raw.device.clone(), sn.trim().to_string()))
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|(device, sn)| CorrelationKey::new(device, sn))
        .collect()
}

pub async fn run(config_path: Option<&Path>, input: &Path, progress: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let fragments = read_fragments(input)?;
    tracing::info!(
        "[Replay] {} fragments from {}",
        fragments.len(),
        input.display()
    );

    let registry = Arc::new(PendingQueryRegistry::new(config.waiter_key_prefix.clone()));
    let aggregator = Arc::new(FragmentAggregator::new(
        Arc::new(MemoryFragmentStore::new()),
        registry.clone(),
        config.clone(),
    ));
    let handler = RecordInfoHandler::new(
        aggregator,
        Arc::new(LogAcknowledger),
        WorkerPool::new(config.worker_pool_size),
    );

    if progress {
        let mut events = registry.subscribe_progress();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                tracing::info!(
                    "[Replay] {}/{} progress {}/{} (+{})",
                    event.device_id,
                    event.sn,
                    event.running_count,
                    event.sum_num,
                    event.delta_count
                );
            }
        });
    }

    // Waiters must exist before the first fragment can complete a query.
    let mut waiters = Vec::new();
    for key in query_keys(&fragments) {
        let pending = registry.register_waiter(&key).await;
        waiters.push((key, pending));
    }

    for raw in fragments {
        handler.handle(raw).await;
    }

    let mut results: Vec<RecordInfo> = Vec::new();
    for (key, pending) in waiters {
        match pending.wait(config.waiter_timeout()).await {
            Ok(info) => results.push(info),
            Err(e) => tracing::warn!("[Replay] Query {} did not complete: {}", key, e),
        }
    }
    handler.shutdown().await;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
