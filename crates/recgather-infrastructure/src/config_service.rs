//! Configuration service implementation.
//!
//! Loads the `[aggregator]` table from a TOML file and caches it.

use recgather_core::config::{AggregatorConfig, ConfigRoot};
use recgather_core::error::{RecgatherError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the aggregator configuration.
///
/// A missing or empty file yields the defaults. The loaded configuration is
/// validated before it is cached.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: Option<PathBuf>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AggregatorConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService reading from `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a ConfigService that never touches the file system.
    pub fn defaults_only() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading it on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// holds settings rejected by [`AggregatorConfig::validate`].
    pub fn get_config(&self) -> Result<AggregatorConfig> {
        {
            let cached = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = match &self.path {
            Some(path) => Self::load_from(path)?,
            None => AggregatorConfig::default(),
        };
        loaded.validate()?;

        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cached = None;
    }

    fn load_from(path: &Path) -> Result<AggregatorConfig> {
        if !path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                path.display()
            );
            return Ok(AggregatorConfig::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(AggregatorConfig::default());
        }

        let root: ConfigRoot = toml::from_str(&content).map_err(|e| {
            RecgatherError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(root.aggregator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("recgather.toml"));

        assert_eq!(service.get_config().unwrap(), AggregatorConfig::default());
    }

    #[test]
    fn test_loads_aggregator_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recgather.toml");
        fs::write(
            &path,
            "[aggregator]\nrecord_info_ttl_secs = 600\nworker_pool_size = 3\n",
        )
        .unwrap();

        let config = ConfigService::with_path(&path).get_config().unwrap();

        assert_eq!(config.record_info_ttl_secs, 600);
        assert_eq!(config.worker_pool_size, 3);
        assert_eq!(config.waiter_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recgather.toml");
        fs::write(&path, "[aggregator]\nworker_pool_size = 0\n").unwrap();

        let err = ConfigService::with_path(&path).get_config().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_cache_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("recgather.toml");
        fs::write(&path, "[aggregator]\nrecord_info_ttl_secs = 10\n").unwrap();

        let service = ConfigService::with_path(&path);
        assert_eq!(service.get_config().unwrap().record_info_ttl_secs, 10);

        fs::write(&path, "[aggregator]\nrecord_info_ttl_secs = 20\n").unwrap();
        assert_eq!(service.get_config().unwrap().record_info_ttl_secs, 10);

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().record_info_ttl_secs, 20);
    }
}
