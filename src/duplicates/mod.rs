//! Duplicate directory detection.
//!
//! This module provides functionality for:
//! - Content signatures and candidate grouping ([`groups`])
//! - Pairwise comparison with upward escalation ([`engine`])
//! - Subtree disk usage for reported pairs ([`size`])
//! - The end-to-end pipeline ([`finder`])

pub mod engine;
pub mod finder;
pub mod groups;
pub mod size;

use std::path::PathBuf;

use serde::Serialize;

pub use engine::{CheckedPairs, EngineStats, EquivalenceEngine};
pub use finder::{DedupeSummary, DirectoryFinder, FinderConfig, FinderError};
pub use groups::{
    are_duplicates, group_by_signature, CandidateGroup, ContentSignature, GroupingStats,
};
pub use size::{bytes_to_mb, subtree_size, BYTES_PER_MB};

/// One reported duplicate directory pair.
///
/// `size_mb` is the recursive size of `dir1` in binary megabytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicatePairRecord {
    /// First directory of the pair
    pub dir1: PathBuf,
    /// Second directory of the pair
    pub dir2: PathBuf,
    /// Size of the whole subtree under `dir1`, in MiB
    pub size_mb: f64,
}

impl DuplicatePairRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(dir1: PathBuf, dir2: PathBuf, size_mb: f64) -> Self {
        Self {
            dir1,
            dir2,
            size_mb,
        }
    }

    /// Size formatted with two decimals, as written to reports.
    #[must_use]
    pub fn size_display(&self) -> String {
        format!("{:.2}", self.size_mb)
    }
}
