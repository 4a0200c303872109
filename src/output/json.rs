//! JSON report for duplicate directory pairs.
//!
//! Rows are collected during the run and written as one document when the
//! run finishes. An interrupted run still writes the rows found so far, with
//! `"interrupted": true` and a `null` summary.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-01-01T00:00:00Z",
//!   "interrupted": false,
//!   "pairs": [
//!     { "dir1": "/x/photos", "dir2": "/y/photos", "size_mb": 12.5 }
//!   ],
//!   "summary": {
//!     "pairs_reported": 1,
//!     "total_mb": 12.5,
//!     "total_bytes": 13107200,
//!     "files_indexed": 40,
//!     "files_skipped": 0,
//!     "directories_indexed": 6,
//!     "candidate_groups": 1,
//!     "pairs_evaluated": 2,
//!     "duration_ms": 31
//!   }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ReportError, ReportSink};
use crate::duplicates::{DedupeSummary, DuplicatePairRecord};

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Rows reported
    pub pairs_reported: usize,
    /// Grand total of reported sizes in MiB
    pub total_mb: f64,
    /// Grand total of reported sizes in bytes
    pub total_bytes: u64,
    /// Files fingerprinted
    pub files_indexed: usize,
    /// Files skipped as unreadable or unresolvable
    pub files_skipped: usize,
    /// Directories holding at least one indexed file
    pub directories_indexed: usize,
    /// Signatures shared by two or more directories
    pub candidate_groups: usize,
    /// Distinct directory pairs evaluated
    pub pairs_evaluated: usize,
    /// Duration of the run in milliseconds
    pub duration_ms: u64,
}

impl JsonSummary {
    /// Create a JSON summary from a run summary.
    #[must_use]
    pub fn from_summary(summary: &DedupeSummary) -> Self {
        Self {
            pairs_reported: summary.engine.pairs_reported,
            total_mb: summary.engine.total_mb,
            total_bytes: summary.engine.total_bytes,
            files_indexed: summary.index.files_indexed,
            files_skipped: summary.index.files_skipped,
            directories_indexed: summary.engine.grouping.total_directories,
            candidate_groups: summary.engine.grouping.candidate_groups,
            pairs_evaluated: summary.engine.pairs_evaluated,
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    generated_at: DateTime<Utc>,
    interrupted: bool,
    pairs: &'a [DuplicatePairRecord],
    summary: Option<JsonSummary>,
}

/// JSON report writer.
pub struct JsonReport<W: Write> {
    writer: Option<W>,
    pairs: Vec<DuplicatePairRecord>,
    pretty: bool,
}

impl<W: Write> JsonReport<W> {
    /// Create a report that writes pretty-printed JSON to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            pairs: Vec::new(),
            pretty: true,
        }
    }

    /// Write compact JSON instead.
    #[must_use]
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Rows collected so far.
    #[must_use]
    pub fn pairs(&self) -> &[DuplicatePairRecord] {
        &self.pairs
    }

    /// Return the writer if the report has not been finished yet.
    pub fn into_inner(self) -> Option<W> {
        self.writer
    }

    fn write_document(&mut self, summary: Option<JsonSummary>) -> Result<(), ReportError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        let document = JsonDocument {
            generated_at: Utc::now(),
            interrupted: summary.is_none(),
            pairs: &self.pairs,
            summary,
        };
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, &document)?;
        } else {
            serde_json::to_writer(&mut writer, &document)?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write> ReportSink for JsonReport<W> {
    fn record(&mut self, record: &DuplicatePairRecord) -> Result<(), ReportError> {
        self.pairs.push(record.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &DedupeSummary) -> Result<(), ReportError> {
        self.write_document(Some(JsonSummary::from_summary(summary)))
    }

    fn abort(&mut self) -> Result<(), ReportError> {
        log::debug!("Writing partial JSON report with {} rows", self.pairs.len());
        self.write_document(None)
    }
}
