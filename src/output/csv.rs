//! CSV report for duplicate directory pairs.
//!
//! One row is written per reported pair, flushed immediately so a long run
//! leaves a usable report even if it is interrupted.
//!
//! # Columns
//!
//! - `Directory1`: First directory of the pair
//! - `Directory2`: Second directory of the pair
//! - `Size (MB)`: Recursive size of `Directory1` in MiB, two decimals

use std::fs::File;
use std::io;
use std::path::Path;

use super::{ReportError, ReportSink};
use crate::duplicates::{DedupeSummary, DuplicatePairRecord};

/// Header row of the CSV report.
pub const CSV_HEADER: [&str; 3] = ["Directory1", "Directory2", "Size (MB)"];

/// CSV report writer.
pub struct CsvReport<W: io::Write> {
    writer: ::csv::Writer<W>,
    rows: usize,
}

impl CsvReport<File> {
    /// Create (or truncate) the report file at `path` and write the header.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the file cannot be created or written.
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = File::create(path)?;
        log::debug!("Writing CSV report to {}", path.display());
        Self::new(file)
    }
}

impl<W: io::Write> CsvReport<W> {
    /// Wrap `writer` and write the header row right away.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if the header cannot be written.
    pub fn new(writer: W) -> Result<Self, ReportError> {
        let mut writer = ::csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    /// Number of data rows written.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if buffered rows cannot be flushed.
    pub fn into_inner(self) -> Result<W, ReportError> {
        self.writer
            .into_inner()
            .map_err(|e| ReportError::Io(io::Error::new(e.error().kind(), e.error().to_string())))
    }
}

impl<W: io::Write> ReportSink for CsvReport<W> {
    fn record(&mut self, record: &DuplicatePairRecord) -> Result<(), ReportError> {
        let dir1 = record.dir1.to_string_lossy();
        let dir2 = record.dir2.to_string_lossy();
        let size = record.size_display();
        self.writer.write_record([&*dir1, &*dir2, size.as_str()])?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self, _summary: &DedupeSummary) -> Result<(), ReportError> {
        self.writer.flush()?;
        Ok(())
    }

    fn abort(&mut self) -> Result<(), ReportError> {
        self.writer.flush()?;
        Ok(())
    }
}
