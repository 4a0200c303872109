//! Duplicate directory finder: the end-to-end pipeline.
//!
//! # Overview
//!
//! [`DirectoryFinder`] owns one run:
//! 1. **Index** - walk the roots and fingerprint every file
//!    (see [`crate::scanner::index`])
//! 2. **Group** - bucket directories by content signature
//!    (see [`crate::duplicates::groups`])
//! 3. **Compare** - evaluate candidate pairs and escalate matches
//!    (see [`crate::duplicates::engine`])
//!
//! Rows go to the caller's [`ReportSink`] as they are found.
//!
//! # Example
//!
//! ```no_run
//! use dupedirs::duplicates::{DirectoryFinder, DuplicatePairRecord, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DirectoryFinder::new(FinderConfig::default().with_io_threads(8));
//! let mut rows: Vec<DuplicatePairRecord> = Vec::new();
//! let summary = finder
//!     .find_duplicates(&[PathBuf::from("/backup"), PathBuf::from("/photos")], &mut rows)
//!     .unwrap();
//!
//! println!("{} duplicate pairs, {:.2} MB", rows.len(), summary.total_mb());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::engine::{EngineStats, EquivalenceEngine};
use crate::output::{ReportError, ReportSink};
use crate::progress::ProgressCallback;
use crate::scanner::{
    IndexStats, Indexer, IndexerConfig, WalkerConfig, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE,
};

/// Configuration for the directory finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel fingerprinting.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Read buffer size for fingerprinting.
    pub buffer_size: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("buffer_size", &self.buffer_size)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            buffer_size: DEFAULT_BUFFER_SIZE,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Create a new configuration with custom I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the fingerprinting read buffer size, clamped to
    /// `1..=MAX_BUFFER_SIZE`.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn indexer_config(&self) -> IndexerConfig {
        let mut config = IndexerConfig::default()
            .with_io_threads(self.io_threads)
            .with_buffer_size(self.buffer_size)
            .with_walker_config(self.walker_config.clone());
        if let Some(ref flag) = self.shutdown_flag {
            config = config.with_shutdown_flag(flag.clone());
        }
        if let Some(ref cb) = self.progress_callback {
            config = config.with_progress_callback(cb.clone());
        }
        config
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Default)]
pub struct DedupeSummary {
    /// Indexing counters
    pub index: IndexStats,
    /// Grouping and comparison counters
    pub engine: EngineStats,
    /// Wall time of the whole run
    pub duration: Duration,
}

impl DedupeSummary {
    /// Whether any duplicate pair was reported.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.engine.has_duplicates()
    }

    /// Grand total of reported sizes in MiB.
    ///
    /// Nested levels of one chain are each counted in full.
    #[must_use]
    pub fn total_mb(&self) -> f64 {
        self.engine.total_mb
    }

    /// Grand total as a human-readable size.
    #[must_use]
    pub fn total_display(&self) -> String {
        ByteSize::b(self.engine.total_bytes).to_string()
    }

    /// Number of rows reported.
    #[must_use]
    pub fn pairs_reported(&self) -> usize {
        self.engine.pairs_reported
    }
}

/// Errors that can occur while finding duplicate directories.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The run was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred with a specific path.
    #[error("I/O error for {path}: {source}")]
    IoWithPath {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The fingerprinting thread pool could not be built.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(String),

    /// The report sink failed.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Runs indexing and comparison for a set of roots.
#[derive(Debug)]
pub struct DirectoryFinder {
    config: FinderConfig,
}

impl DirectoryFinder {
    /// Create a new finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Find duplicate directories under `roots`, writing rows to `sink`.
    ///
    /// An empty `roots` slice is valid and reports nothing. On interruption
    /// the sink is aborted, keeping the rows reported so far.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if a root is missing or not a directory, the
    /// sink fails, or the run is interrupted.
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
        sink: &mut dyn ReportSink,
    ) -> Result<DedupeSummary, FinderError> {
        let result = self.run(roots, sink);
        if matches!(result, Err(FinderError::Interrupted)) {
            sink.abort()?;
        }
        result
    }

    fn run(
        &self,
        roots: &[PathBuf],
        sink: &mut dyn ReportSink,
    ) -> Result<DedupeSummary, FinderError> {
        let start = Instant::now();

        let indexer = Indexer::new(self.config.indexer_config());
        let (index, index_stats) = indexer.index(roots)?;

        if self.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut engine = EquivalenceEngine::new(&index);
        if let Some(ref flag) = self.config.shutdown_flag {
            engine = engine.with_shutdown_flag(flag.clone());
        }
        if let Some(ref cb) = self.config.progress_callback {
            engine = engine.with_progress_callback(cb.clone());
        }
        let engine_stats = engine.run(sink)?;

        let summary = DedupeSummary {
            index: index_stats,
            engine: engine_stats,
            duration: start.elapsed(),
        };
        sink.finish(&summary)?;

        if summary.has_duplicates() {
            log::info!(
                "Found {} duplicate directory pairs totalling {:.2} MB ({})",
                summary.pairs_reported(),
                summary.total_mb(),
                summary.total_display()
            );
        } else {
            log::info!("No duplicates found");
        }
        Ok(summary)
    }
}
