//! Report sinks for duplicate directory pairs.
//!
//! This module provides different report formats:
//! - CSV, written row by row as pairs are found
//! - JSON for automation and scripting, written once the run completes or
//!   is interrupted
//!
//! Any [`ReportSink`] can be handed to
//! [`DirectoryFinder::find_duplicates`](crate::duplicates::DirectoryFinder::find_duplicates);
//! a plain `Vec<DuplicatePairRecord>` collects rows in memory.
//!
//! # Example
//!
//! ```no_run
//! use dupedirs::duplicates::DirectoryFinder;
//! use dupedirs::output::CsvReport;
//! use std::path::{Path, PathBuf};
//!
//! let mut report = CsvReport::create(Path::new("findDuplicateDirectories.csv")).unwrap();
//! let finder = DirectoryFinder::with_defaults();
//! finder.find_duplicates(&[PathBuf::from(".")], &mut report).unwrap();
//! ```

pub mod csv;
pub mod json;

use std::io;

use thiserror::Error;

use crate::duplicates::{DedupeSummary, DuplicatePairRecord};

// Re-export main types
pub use self::csv::CsvReport;
pub use self::json::JsonReport;

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    /// Error during JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for reported duplicate pairs.
pub trait ReportSink {
    /// Persist one reported pair.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the row cannot be written.
    fn record(&mut self, record: &DuplicatePairRecord) -> Result<(), ReportError>;

    /// Called once after the last row with the run summary.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the report cannot be completed.
    fn finish(&mut self, _summary: &DedupeSummary) -> Result<(), ReportError> {
        Ok(())
    }

    /// Called instead of [`ReportSink::finish`] when the run is interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the partial report cannot be written.
    fn abort(&mut self) -> Result<(), ReportError> {
        Ok(())
    }
}

impl ReportSink for Vec<DuplicatePairRecord> {
    fn record(&mut self, record: &DuplicatePairRecord) -> Result<(), ReportError> {
        self.push(record.clone());
        Ok(())
    }
}
