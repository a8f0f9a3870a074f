//! Tracing subscriber setup

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

/// Build the log filter: `RUST_LOG` when set, otherwise `log_level`
///
/// Unknown level names fall back to `info`.
pub fn log_filter(log_level: &str) -> EnvFilter {
    let level = log_level.parse::<Level>().unwrap_or(Level::INFO);
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

/// Install the global subscriber, logging to stderr
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default tracing subscriber")
}
