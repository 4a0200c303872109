//! dupedirs - Duplicate Directory Finder
//!
//! Finds directory trees whose files have identical content, using BLAKE3
//! fingerprints. Directories with the same set of file contents are paired,
//! each matching pair is followed up through its parents, and every pair is
//! reported with the size of the duplicated subtree.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::CommandFactory;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::duplicates::{DedupeSummary, DirectoryFinder, FinderError};
use crate::error::ExitCode;
use crate::output::{CsvReport, JsonReport};
use crate::progress::Progress;

/// Run the application for parsed command-line arguments.
///
/// Without any paths a usage message is printed and nothing is indexed or
/// written. Otherwise the report file is created first (for CSV, with its
/// header) and then filled as the run progresses.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, a root is missing or
/// not a directory, or the report cannot be written. Interruption is not an
/// error: it yields [`ExitCode::Interrupted`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.paths.is_empty() {
        eprintln!("No directories given.\n\n{}", Cli::command().render_usage());
        return Ok(ExitCode::NoDuplicates);
    }

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_cli_overrides(&cli);
    let report_path = config.report_path();

    let handler = signal::install_handler()?;
    let progress = Arc::new(Progress::new(cli.quiet || cli.no_progress));
    let finder = DirectoryFinder::new(
        config
            .finder_config()
            .with_shutdown_flag(handler.get_flag())
            .with_progress_callback(progress),
    );

    log::info!(
        "Searching {} root(s), writing {} report to {}",
        cli.paths.len(),
        config.output,
        report_path.display()
    );

    let result = match config.output {
        OutputFormat::Csv => {
            let mut report = CsvReport::create(&report_path)
                .with_context(|| format!("Failed to create report {}", report_path.display()))?;
            finder.find_duplicates(&cli.paths, &mut report)
        }
        OutputFormat::Json => {
            let file = File::create(&report_path)
                .with_context(|| format!("Failed to create report {}", report_path.display()))?;
            let mut report = JsonReport::new(BufWriter::new(file));
            finder.find_duplicates(&cli.paths, &mut report)
        }
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(FinderError::Interrupted) => {
            log::warn!("Interrupted; report {} is incomplete", report_path.display());
            return Ok(ExitCode::Interrupted);
        }
        Err(e) => return Err(e.into()),
    };

    if !cli.quiet {
        print_summary(&summary, &report_path);
    }

    Ok(if summary.has_duplicates() {
        ExitCode::Success
    } else {
        ExitCode::NoDuplicates
    })
}

fn print_summary(summary: &DedupeSummary, report_path: &Path) {
    if !summary.has_duplicates() {
        println!("No duplicates found");
        return;
    }

    println!(
        "Found {} duplicate directory pairs in {:.2?}",
        summary.pairs_reported(),
        summary.duration
    );
    println!(
        "Total duplicate size: {:.2} MB ({})",
        summary.total_mb(),
        summary.total_display()
    );
    println!("Report written to {}", report_path.display());
}
