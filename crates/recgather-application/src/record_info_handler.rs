//! Entry point for record query replies coming off the transport.
//!
//! The transport calls [`RecordInfoHandler::handle`] once per reply packet.
//! The packet is acknowledged right away, then decoding and aggregation run on
//! the worker pool so the transport never waits on the fragment store.

use crate::aggregator::FragmentAggregator;
use crate::worker_pool::WorkerPool;
use async_trait::async_trait;
use recgather_core::error::Result;
use recgather_core::fragment::{Fragment, RawFragment};
use std::sync::Arc;

/// Sends the protocol-level acknowledgment for a received packet.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn acknowledge(&self, raw: &RawFragment) -> Result<()>;
}

/// Acknowledges packets, then hands them to the aggregator on the worker pool.
pub struct RecordInfoHandler {
    aggregator: Arc<FragmentAggregator>,
    acknowledger: Arc<dyn Acknowledger>,
    pool: WorkerPool,
}

impl RecordInfoHandler {
    /// Creates a new handler.
    ///
    /// # Arguments
    ///
    /// * `aggregator` - Aggregator shared by every worker
    /// * `acknowledger` - Transport acknowledgment sender
    /// * `pool` - Worker pool fragments are dispatched onto
    pub fn new(
        aggregator: Arc<FragmentAggregator>,
        acknowledger: Arc<dyn Acknowledger>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            aggregator,
            acknowledger,
            pool,
        }
    }

    /// Handles one reply packet.
    ///
    /// Returns once the packet is acknowledged and queued. A failed
    /// acknowledgment is logged and the packet is still aggregated.
    pub async fn handle(&self, raw: RawFragment) {
        if let Err(e) = self.acknowledger.acknowledge(&raw).await {
            tracing::error!(
                "[RecordInfo] Failed to acknowledge reply from {}: {}",
                raw.device,
                e
            );
        }

        let device = raw.device.clone();
        let aggregator = Arc::clone(&self.aggregator);
        let queued = self.pool.submit(async move {
            match Fragment::decode(raw) {
                Ok(fragment) => aggregator.ingest(fragment).await,
                Err(e) => tracing::error!(
                    "[RecordInfo] Dropped malformed reply from {}: {}",
                    device,
                    e
                ),
            }
        });

        if let Err(e) = queued {
            tracing::error!("[RecordInfo] Could not queue reply: {}", e);
        }
    }

    /// Stops accepting packets and waits for queued ones to finish.
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}
