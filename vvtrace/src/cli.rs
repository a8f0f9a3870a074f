//! Command line definition and the run it drives

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use vvtrace_core::{
    coverage::TraceCoverage,
    export::{self, OutputFormat},
    inputs::{load_batches, load_id_list, load_links, load_trace_matrix},
    PipelineOutput, ReferenceLists, TestMethod, TracePipeline,
};

use crate::helpers::config::load_config;

/// vvtrace - V&V requirements trace matrix builder
#[derive(Parser, Debug, Clone)]
#[command(name = "vvtrace")]
#[command(
    version,
    about = "Build a PRD -> SRS -> test trace matrix from V&V results",
    long_about = "
Build a PRD -> SRS -> test trace matrix from V&V results

Test results are JSON record batches, one per as-run report or automated
log. Every record whose test name carries SRS references becomes one
matrix row per reference. Rows failing a referential check are moved to
the error log together with the reason. An existing trace matrix can be
checked as well, alone or together with the results.

Examples:
  vvtrace -p prd.csv -s obsolete_srs.csv -m as-run/ -a logs/rest.json
  vvtrace -p prd.csv -s obsolete_srs.csv -a logs/ --links trace.csv --coverage
  vvtrace -p prd.csv -s obsolete_srs.csv -a logs/ --format json -o matrix.json -e errors.json
  vvtrace -p prd.csv -s obsolete_srs.csv --trace trace_matrix.csv
"
)]
pub struct Cli {
    /// Trace matrix output file
    #[arg(short = 'o', long = "out", default_value = "trace_matrix.csv")]
    pub out: PathBuf,

    /// Error log output file
    #[arg(short = 'e', long, default_value = "trace_errors.csv")]
    pub error_log: PathBuf,

    /// Manual as-run record batch file or directory (repeatable)
    #[arg(short = 'm', long)]
    pub manual: Vec<PathBuf>,

    /// Automated test log record batch file or directory (repeatable)
    #[arg(short = 'a', long)]
    pub automated: Vec<PathBuf>,

    /// List of obsolete SRS ids
    #[arg(short = 's', long, env = "VVTRACE_OBSOLETE_SRS")]
    pub obsolete_srs: PathBuf,

    /// List of active PRD ids
    #[arg(short = 'p', long, env = "VVTRACE_ACTIVE_PRD")]
    pub active_prd: PathBuf,

    /// PRD -> SRS link list used to fill the PRD column
    #[arg(long)]
    pub links: Option<PathBuf>,

    /// Existing trace matrix to validate along with the results
    #[arg(long)]
    pub trace: Option<PathBuf>,

    /// Prefix of PRD ids (overrides the config file)
    #[arg(long)]
    pub prd_prefix: Option<String>,

    /// Prefix of SRS ids (overrides the config file)
    #[arg(long)]
    pub srs_prefix: Option<String>,

    /// Leave status and name rejects out of the error log
    #[arg(long)]
    pub no_filtered: bool,

    /// Output format of the matrix and the error log
    #[arg(long, value_enum, default_value = "csv")]
    pub format: OutputFormatArg,

    /// Configuration file (default: vvtrace.toml in the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Print the test-to-requirement trace coverage audit
    #[arg(long)]
    pub coverage: bool,
}

/// Available output formats
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Comma-separated values (default)
    Csv,
    /// JSON array of row objects
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(format: OutputFormatArg) -> Self {
        match format {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Matrix, error log and summary
    pub output:   PipelineOutput,
    /// Coverage audit, when requested
    pub coverage: Option<TraceCoverage>,
}

/// Load every input, run the pipeline and write the outputs
///
/// Nothing is written unless every input loaded and the run finished.
pub fn run(cli: &Cli) -> Result<RunReport> {
    let root = std::env::current_dir().context("Failed to get current directory")?;
    let config = load_config(cli, &root)?;

    let references = ReferenceLists {
        active_prd_ids:   load_id_list(&cli.active_prd).context("Failed to load active PRD list")?,
        obsolete_srs_ids: load_id_list(&cli.obsolete_srs)
            .context("Failed to load obsolete SRS list")?,
    };
    info!(
        active_prd = references.active_prd_ids.len(),
        obsolete_srs = references.obsolete_srs_ids.len(),
        "loaded reference lists"
    );

    let links = cli
        .links
        .as_deref()
        .map(load_links)
        .transpose()
        .context("Failed to load requirement links")?;

    let mut batches = load_batches(&cli.manual, Some(TestMethod::Manual))
        .context("Failed to load manual test results")?;
    batches.extend(
        load_batches(&cli.automated, Some(TestMethod::Automatic))
            .context("Failed to load automated test results")?,
    );
    let trace_rows = cli
        .trace
        .as_deref()
        .map(load_trace_matrix)
        .transpose()
        .context("Failed to load existing trace matrix")?;
    if batches.is_empty() && trace_rows.is_none() {
        warn!("no test record batches given, the trace matrix will be empty");
    }

    let mut pipeline = TracePipeline::new(config, references)?;
    if let Some(links) = links {
        pipeline = pipeline.with_links(links);
    }
    if let Some(rows) = trace_rows {
        pipeline = pipeline.with_trace_rows(rows);
    }
    let output = pipeline.run(&batches);

    export::write_outputs(&output, &cli.out, &cli.error_log, cli.format.into())
        .context("Failed to write trace outputs")?;
    if let Some(path) = &cli.summary_json {
        export::write_output(path, &export::summary_to_json(&output.summary)?)
            .context("Failed to write run summary")?;
    }

    let coverage = cli.coverage.then(|| pipeline.coverage(&output.matrix));

    Ok(RunReport { output, coverage })
}
