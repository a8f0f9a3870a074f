//! vvtrace - V&V trace matrix command line
//!
//! Library half of the `vvtrace` binary: the argument definition, the run it
//! drives and the helpers around it. The engine lives in `vvtrace-core`.

#![forbid(unsafe_code)]

pub mod cli;
pub mod helpers;

pub use cli::{run, Cli, OutputFormatArg, RunReport};
