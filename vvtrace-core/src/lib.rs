//! vvtrace core - V&V requirements trace matrix engine
//!
//! This library turns test execution results into a trace matrix linking
//! product requirements (PRD) to system requirements (SRS) to the tests that
//! verify them, and logs every record or row that could not be traced.
//!
//! # Architecture
//!
//! A run is a linear pipeline driven by [`TracePipeline`]:
//!
//! - **Normalization**: raw source rows become [`TestRecord`]s
//!   ([`records`])
//! - **Construction**: each record fans out into one [`TraceRow`] per SRS
//!   reference in its test name ([`builder`], [`extract`])
//! - **Existing rows**: rows of an already maintained trace matrix can be
//!   appended to the built rows ([`inputs::load_trace_matrix`])
//! - **Resolution**: optional PRD → SRS links fill the PRD column
//!   ([`hierarchy`])
//! - **Validation**: six referential checks partition rows into valid and
//!   rejected ([`validate`])
//! - **Aggregation**: every reject lands in one ordered [`ErrorLog`]
//!   ([`aggregate`])
//!
//! Loading inputs ([`inputs`]) and writing outputs ([`export`]) sit outside
//! the pipeline so it never does I/O.

#![forbid(unsafe_code)]
// Lints configured in Cargo.toml

pub mod aggregate;
pub mod builder;
pub mod config;
pub mod coverage;
pub mod delimited;
pub mod error;
pub mod export;
pub mod extract;
pub mod hierarchy;
pub mod inputs;
pub mod pipeline;
pub mod records;
pub mod trace;
pub mod validate;

// Public API
pub use aggregate::ErrorLog;
pub use config::TraceConfig;
pub use error::{
    TraceError,
    TraceResult,
};
pub use export::OutputFormat;
pub use hierarchy::RequirementLinks;
pub use pipeline::{
    PipelineOutput,
    RunSummary,
    TracePipeline,
};
pub use records::RecordBatch;
pub use trace::{
    RejectReason,
    RejectedRow,
    TestMethod,
    TestRecord,
    TestStatus,
    TraceRow,
};
pub use validate::ReferenceLists;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
