//! vvtrace - V&V requirements trace matrix builder
//!
//! Main CLI entry point. Loads reference lists and test record batches,
//! runs the trace pipeline and writes the matrix and the error log.

use std::process;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use vvtrace::{
    cli::{run, Cli},
    helpers::{init_logging, render_coverage, render_summary},
};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = execute(&cli) {
        eprintln!("{} {:#}", "error:".bright_red().bold(), e);
        process::exit(1);
    }
}

fn execute(cli: &Cli) -> Result<()> {
    init_logging(&cli.log_level)?;

    let report = run(cli)?;

    print!("{}", render_summary(&report.output.summary));
    if let Some(coverage) = &report.coverage {
        println!();
        print!("{}", render_coverage(coverage));
    }

    println!();
    println!("{} {}", "Trace matrix:".bright_green(), cli.out.display());
    println!("{} {}", "Error log:   ".bright_green(), cli.error_log.display());
    if let Some(path) = &cli.summary_json {
        println!("{} {}", "Summary:     ".bright_green(), path.display());
    }

    Ok(())
}
