//! Helper modules for the vvtrace command line
//!
//! Configuration merging, logging setup and human-readable reports shared
//! by the binary and its tests.

pub mod config;
pub mod logging;
pub mod output;

// Re-export commonly used items
pub use config::{load_config, merge_cli_args};
pub use logging::{init_logging, log_filter};
pub use output::{render_coverage, render_summary};
