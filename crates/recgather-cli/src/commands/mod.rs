pub mod config;
pub mod replay;

use anyhow::{Context, Result};
use recgather_core::AggregatorConfig;
use recgather_infrastructure::ConfigService;
use std::path::Path;

/// Loads the configuration from `path`, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<AggregatorConfig> {
    let service = match path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::defaults_only(),
    };
    service
        .get_config()
        .context("Failed to load configuration")
}
