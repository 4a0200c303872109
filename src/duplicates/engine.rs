//! Directory equivalence engine.
//!
//! # Overview
//!
//! For every candidate group the engine compares each unordered pair of
//! member directories once. A pair that holds the same set of direct file
//! digests is reported, then the engine climbs to the two parents and keeps
//! reporting for as long as each new parent pair is itself equivalent.
//!
//! Every level is judged on its own direct files only. Two parents whose
//! children match but who hold no files of their own are *not* duplicates,
//! so a chain stops at the first level that adds nothing of its own.
//!
//! A chain also stops when:
//! - the filesystem root is reached,
//! - both sides climb into the same directory,
//! - the parent pair has already been evaluated earlier in the run.
//!
//! The last rule keeps every unordered pair at most once in the output.
//!
//! # Example
//!
//! ```
//! use dupedirs::duplicates::{DuplicatePairRecord, EquivalenceEngine};
//! use dupedirs::scanner::TreeIndex;
//! use std::path::PathBuf;
//!
//! let mut index = TreeIndex::new();
//! index.insert(PathBuf::from("/x/a"), PathBuf::from("/x/a/f"), [7u8; 32]);
//! index.insert(PathBuf::from("/y/a"), PathBuf::from("/y/a/f"), [7u8; 32]);
//!
//! let mut rows: Vec<DuplicatePairRecord> = Vec::new();
//! let stats = EquivalenceEngine::new(&index).run(&mut rows).unwrap();
//!
//! // (/x/a, /y/a) is reported, then (/x, /y) is evaluated and rejected.
//! assert_eq!(rows.len(), 1);
//! assert_eq!(stats.pairs_evaluated, 2);
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::groups::{are_duplicates, group_by_signature, GroupingStats};
use super::size::{bytes_to_mb, subtree_size};
use super::{DuplicatePairRecord, FinderError};
use crate::output::ReportSink;
use crate::progress::{ProgressCallback, PHASE_COMPARING};
use crate::scanner::TreeIndex;

/// Memo of unordered directory pairs already evaluated.
#[derive(Debug, Clone, Default)]
pub struct CheckedPairs {
    pairs: HashSet<(PathBuf, PathBuf)>,
}

impl CheckedPairs {
    /// Create an empty memo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &Path, b: &Path) -> (PathBuf, PathBuf) {
        if a <= b {
            (a.to_path_buf(), b.to_path_buf())
        } else {
            (b.to_path_buf(), a.to_path_buf())
        }
    }

    /// Mark `(a, b)` as evaluated; returns false if it already was, in
    /// either order.
    pub fn insert(&mut self, a: &Path, b: &Path) -> bool {
        self.pairs.insert(Self::key(a, b))
    }

    /// Whether `(a, b)` was evaluated, in either order.
    #[must_use]
    pub fn contains(&self, a: &Path, b: &Path) -> bool {
        self.pairs.contains(&Self::key(a, b))
    }

    /// Number of distinct pairs recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pair was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Counters collected by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Candidate grouping statistics
    pub grouping: GroupingStats,
    /// Distinct unordered pairs evaluated (candidate and escalated)
    pub pairs_evaluated: usize,
    /// Candidate pairs skipped because an earlier chain covered them
    pub pairs_skipped: usize,
    /// Rows emitted to the report
    pub pairs_reported: usize,
    /// Parent levels climbed across all chains
    pub escalation_steps: usize,
    /// Most parent levels climbed by a single chain
    pub longest_chain: usize,
    /// Sum of the reported subtree sizes in bytes
    pub total_bytes: u64,
    /// Sum of the reported sizes in MiB
    pub total_mb: f64,
}

impl EngineStats {
    /// Whether at least one pair was reported.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.pairs_reported > 0
    }
}

/// Finds maximal duplicate directory pairs over a [`TreeIndex`].
pub struct EquivalenceEngine<'a> {
    index: &'a TreeIndex,
    checked: CheckedPairs,
    stats: EngineStats,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl<'a> EquivalenceEngine<'a> {
    /// Create an engine over `index`.
    #[must_use]
    pub fn new(index: &'a TreeIndex) -> Self {
        Self {
            index,
            checked: CheckedPairs::new(),
            stats: EngineStats::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
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

    /// Pairs evaluated so far.
    #[must_use]
    pub fn checked_pairs(&self) -> &CheckedPairs {
        &self.checked
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compare every candidate pair and emit one row per equivalent level.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Report`] if the sink fails and
    /// [`FinderError::Interrupted`] if shutdown was requested.
    pub fn run(&mut self, sink: &mut dyn ReportSink) -> Result<EngineStats, FinderError> {
        let index = self.index;
        let (groups, grouping) = group_by_signature(index);
        self.stats.grouping = grouping;

        if let Some(ref cb) = self.progress_callback {
            cb.on_phase_start(PHASE_COMPARING, groups.len());
        }

        for (n, group) in groups.iter().enumerate() {
            if self.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }
            log::trace!(
                "Comparing {} directories sharing {}",
                group.directories.len(),
                group.signature.label()
            );

            for (i, dir1) in group.directories.iter().enumerate() {
                for dir2 in &group.directories[i + 1..] {
                    if !self.checked.insert(dir1, dir2) {
                        self.stats.pairs_skipped += 1;
                        continue;
                    }
                    self.stats.pairs_evaluated += 1;
                    self.escalate(dir1.clone(), dir2.clone(), sink)?;
                }
            }

            if let Some(ref cb) = self.progress_callback {
                let label = group
                    .directories
                    .first()
                    .map(|d| d.to_string_lossy().into_owned())
                    .unwrap_or_default();
                cb.on_progress(n + 1, &label);
            }
        }

        if let Some(ref cb) = self.progress_callback {
            cb.on_phase_end(PHASE_COMPARING);
        }

        debug_assert_eq!(self.checked.len(), self.stats.pairs_evaluated);
        Ok(self.stats.clone())
    }

    /// Report `(dir1, dir2)` and climb while the parents stay equivalent.
    fn escalate(
        &mut self,
        mut dir1: PathBuf,
        mut dir2: PathBuf,
        sink: &mut dyn ReportSink,
    ) -> Result<(), FinderError> {
        let mut steps = 0;
        while are_duplicates(self.index, &dir1, &dir2) {
            let bytes = subtree_size(&dir1);
            let size_mb = bytes_to_mb(bytes);
            self.stats.total_bytes += bytes;
            self.stats.total_mb += size_mb;
            self.stats.pairs_reported += 1;

            log::info!(
                "Duplicate: {} == {} ({:.2} MB)",
                dir1.display(),
                dir2.display(),
                size_mb
            );
            sink.record(&DuplicatePairRecord::new(dir1.clone(), dir2.clone(), size_mb))?;

            let (parent1, parent2) = match (dir1.parent(), dir2.parent()) {
                (Some(p1), Some(p2)) => (p1.to_path_buf(), p2.to_path_buf()),
                _ => {
                    log::trace!("Reached filesystem root, stopping chain");
                    break;
                }
            };
            if parent1 == parent2 {
                log::trace!("Chain met at {}, stopping", parent1.display());
                break;
            }
            if !self.checked.insert(&parent1, &parent2) {
                log::trace!(
                    "Parents {} and {} already evaluated",
                    parent1.display(),
                    parent2.display()
                );
                break;
            }

            self.stats.pairs_evaluated += 1;
            self.stats.escalation_steps += 1;
            steps += 1;
            dir1 = parent1;
            dir2 = parent2;
        }
        self.stats.longest_chain = self.stats.longest_chain.max(steps);
        Ok(())
    }
}
