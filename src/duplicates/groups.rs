//! Content signatures and candidate grouping.
//!
//! # Overview
//!
//! A directory's [`ContentSignature`] is the *set* of digests of the files
//! directly inside it: file names, order and repeated copies inside the same
//! directory do not matter. Directories sharing a signature are candidates
//! for being duplicates of each other; a signature held by a single
//! directory is dropped right away.
//!
//! # Example
//!
//! ```
//! use dupedirs::duplicates::group_by_signature;
//! use dupedirs::scanner::TreeIndex;
//! use std::path::PathBuf;
//!
//! let mut index = TreeIndex::new();
//! index.insert(PathBuf::from("/a"), PathBuf::from("/a/x"), [1u8; 32]);
//! index.insert(PathBuf::from("/b"), PathBuf::from("/b/x"), [1u8; 32]);
//! index.insert(PathBuf::from("/c"), PathBuf::from("/c/y"), [2u8; 32]);
//!
//! let (groups, stats) = group_by_signature(&index);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].directories, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
//! assert_eq!(stats.total_directories, 3);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::{hash_to_hex, Digest, TreeIndex};

/// Set of digests of a directory's direct files.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentSignature(BTreeSet<Digest>);

impl ContentSignature {
    /// Build a signature from a digest sequence, collapsing repeats.
    #[must_use]
    pub fn from_digests(digests: &[Digest]) -> Self {
        Self(digests.iter().copied().collect())
    }

    /// Signature of `dir` in `index`, if the directory holds indexed files.
    #[must_use]
    pub fn of(index: &TreeIndex, dir: &Path) -> Option<Self> {
        index.contents(dir).map(Self::from_digests)
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the signature holds no digest.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `digest` is part of the signature.
    #[must_use]
    pub fn contains(&self, digest: &Digest) -> bool {
        self.0.contains(digest)
    }

    /// Digests in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Digest> {
        self.0.iter()
    }

    /// Short hex label for logging: the first digest's prefix and the count.
    #[must_use]
    pub fn label(&self) -> String {
        match self.0.iter().next() {
            Some(first) => format!("{}..({} files)", &hash_to_hex(first)[..12], self.0.len()),
            None => "(empty)".to_string(),
        }
    }
}

/// Directories sharing one content signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateGroup {
    /// The shared signature
    pub signature: ContentSignature,
    /// Member directories, sorted by path
    pub directories: Vec<PathBuf>,
}

impl CandidateGroup {
    /// Number of unordered directory pairs in this group.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        let n = self.directories.len();
        n * n.saturating_sub(1) / 2
    }
}

/// Statistics from candidate grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Directories present in the index
    pub total_directories: usize,
    /// Distinct signatures observed
    pub distinct_signatures: usize,
    /// Signatures shared by two or more directories
    pub candidate_groups: usize,
    /// Directories that belong to a candidate group
    pub candidate_directories: usize,
}

/// Group indexed directories by content signature.
///
/// Only groups with two or more members are returned. Groups come out in
/// signature order and members in path order, so the result is stable for
/// an unchanged index.
#[must_use]
pub fn group_by_signature(index: &TreeIndex) -> (Vec<CandidateGroup>, GroupingStats) {
    let mut by_signature: BTreeMap<ContentSignature, Vec<PathBuf>> = BTreeMap::new();
    for (dir, digests) in index.directories() {
        by_signature
            .entry(ContentSignature::from_digests(digests))
            .or_default()
            .push(dir.to_path_buf());
    }

    let mut stats = GroupingStats {
        total_directories: index.len(),
        distinct_signatures: by_signature.len(),
        ..GroupingStats::default()
    };

    let groups: Vec<CandidateGroup> = by_signature
        .into_iter()
        .filter(|(_, dirs)| dirs.len() > 1)
        .map(|(signature, directories)| CandidateGroup {
            signature,
            directories,
        })
        .collect();

    stats.candidate_groups = groups.len();
    stats.candidate_directories = groups.iter().map(|g| g.directories.len()).sum();

    log::debug!(
        "Grouped {} directories into {} signatures, {} candidate groups",
        stats.total_directories,
        stats.distinct_signatures,
        stats.candidate_groups
    );
    (groups, stats)
}

/// Whether `dir1` and `dir2` hold exactly the same set of direct file
/// digests.
///
/// A directory with no indexed files of its own never matches anything,
/// even another such directory: matching subdirectories alone do not make
/// their parents duplicates.
#[must_use]
pub fn are_duplicates(index: &TreeIndex, dir1: &Path, dir2: &Path) -> bool {
    match (ContentSignature::of(index, dir1), ContentSignature::of(index, dir2)) {
        (Some(a), Some(b)) => !a.is_empty() && a == b,
        _ => false,
    }
}
