use super::load_config;
use anyhow::{Context, Result};
use recgather_core::config::ConfigRoot;
use std::path::Path;

pub fn show(path: Option<&Path>) -> Result<()> {
    let root = ConfigRoot {
        aggregator: load_config(path)?,
    };
    let rendered = toml::to_string_pretty(&root).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
