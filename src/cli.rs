//! Command-line interface definitions for dupedirs.
//!
//! Defined with the clap derive API. Every option here can also come from the
//! configuration file or `DUPEDIRS_*` environment variables (see
//! [`crate::config`]); flags given on the command line win.
//!
//! # Example
//!
//! ```bash
//! # Compare two backup trees, writing findDuplicateDirectories.csv
//! dupedirs /backup/2023 /backup/2024
//!
//! # JSON report to a chosen file
//! dupedirs ~/photos --output json --report photos.json
//!
//! # Verbose mode for debugging
//! dupedirs -v ~/photos
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Find duplicate directory trees.
///
/// Every file under the given roots is fingerprinted, directories holding
/// the same set of file contents are paired, and matching pairs are followed
/// up through their parents. Each pair is written to a report with the size
/// of the duplicated subtree.
#[derive(Debug, Parser)]
#[command(name = "dupedirs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directories to search (overlapping roots are allowed)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Report file to write (default: findDuplicateDirectories.csv or .json)
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Read buffer size for fingerprinting (e.g., 64KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Number of I/O threads for fingerprinting (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Descend into symbolic links to directories
    ///
    /// Symlinks to files are always resolved to their target.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Configuration file to load instead of the platform default
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Report format.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// CSV, one row per pair, written as pairs are found
    #[default]
    Csv,
    /// JSON document with rows and run summary
    Json,
}

impl OutputFormat {
    /// Report file name used when none is configured.
    #[must_use]
    pub fn default_report_name(self) -> &'static str {
        match self {
            OutputFormat::Csv => "findDuplicateDirectories.csv",
            OutputFormat::Json => "findDuplicateDirectories.json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupedirs::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
