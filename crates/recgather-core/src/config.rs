use crate::error::{RecgatherError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_record_info_ttl_secs() -> u64 {
    1800
}

fn default_worker_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_count_key_prefix() -> String {
    "RECORD_INFO_RES_COUNT:".to_string()
}

fn default_set_key_prefix() -> String {
    "RECORD_INFO_RES:".to_string()
}

fn default_done_key_prefix() -> String {
    "RECORD_INFO_RES_DONE:".to_string()
}

fn default_waiter_key_prefix() -> String {
    "CALLBACK_CMD_RECORDINFO:".to_string()
}

fn default_waiter_timeout_secs() -> u64 {
    30
}

/// Settings of the fragment aggregation pipeline.
///
/// Every field has a default, so an empty `[aggregator]` table is valid.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Aggregation window: TTL applied to every session key on every fragment
    #[serde(default = "default_record_info_ttl_secs")]
    pub record_info_ttl_secs: u64,
    /// Number of workers ingesting fragments concurrently
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    #[serde(default = "default_count_key_prefix")]
    pub count_key_prefix: String,
    #[serde(default = "default_set_key_prefix")]
    pub set_key_prefix: String,
    /// Prefix of the counter that claims a session's completion
    #[serde(default = "default_done_key_prefix")]
    pub done_key_prefix: String,
    #[serde(default = "default_waiter_key_prefix")]
    pub waiter_key_prefix: String,
    /// How long callers of a record query wait before giving up
    #[serde(default = "default_waiter_timeout_secs")]
    pub waiter_timeout_secs: u64,
}

impl AggregatorConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.record_info_ttl_secs)
    }

    pub fn waiter_timeout(&self) -> Duration {
        Duration::from_secs(self.waiter_timeout_secs)
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.record_info_ttl_secs == 0 {
            return Err(RecgatherError::config("record_info_ttl_secs must be positive"));
        }
        if self.worker_pool_size == 0 {
            return Err(RecgatherError::config("worker_pool_size must be positive"));
        }
        if self.count_key_prefix == self.set_key_prefix
            || self.count_key_prefix == self.done_key_prefix
            || self.set_key_prefix == self.done_key_prefix
        {
            return Err(RecgatherError::config(
                "count_key_prefix, set_key_prefix and done_key_prefix must differ",
            ));
        }
        Ok(())
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            record_info_ttl_secs: default_record_info_ttl_secs(),
            worker_pool_size: default_worker_pool_size(),
            count_key_prefix: default_count_key_prefix(),
            set_key_prefix: default_set_key_prefix(),
            done_key_prefix: default_done_key_prefix(),
            waiter_key_prefix: default_waiter_key_prefix(),
            waiter_timeout_secs: default_waiter_timeout_secs(),
        }
    }
}

/// Root of the configuration file.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRoot {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}
