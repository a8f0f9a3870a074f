//! Configuration management utilities
//!
//! Loads the trace configuration file and merges command line overrides on
//! top of it.

use std::path::Path;

use anyhow::{Context, Result};
use vvtrace_core::TraceConfig;

use crate::cli::Cli;

/// Load configuration from `--config`, or from the first config file found
/// under `root`, then apply command line overrides
pub fn load_config(cli: &Cli, root: &Path) -> Result<TraceConfig> {
    let config = match &cli.config {
        Some(path) => TraceConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => TraceConfig::load_or_default(root).context("Failed to load config file")?,
    };

    merge_cli_args(cli, config)
}

/// Merge command line arguments over configuration file settings
pub fn merge_cli_args(cli: &Cli, mut config: TraceConfig) -> Result<TraceConfig> {
    if let Some(prefix) = &cli.prd_prefix {
        config.prd_prefix = prefix.clone();
    }
    if let Some(prefix) = &cli.srs_prefix {
        config.srs_prefix = prefix.clone();
    }
    if cli.no_filtered {
        config.include_filtered = false;
    }

    config.validate().context("Invalid configuration after applying command line options")?;
    Ok(config)
}
