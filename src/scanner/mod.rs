//! Scanner module for directory traversal, file hashing and indexing.
//!
//! This module provides functionality for:
//! - Deterministic directory walking using jwalk
//! - Streaming content hashing with BLAKE3
//! - Building the per-directory content index
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//! - [`index`]: The tree indexer tying both together
//!
//! # Example
//!
//! ```no_run
//! use dupedirs::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{} in {}", file.path.display(), file.dir.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod index;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{
    hash_to_hex, unique_token, Digest, Hasher, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE, PREHASH_SIZE,
};
pub use index::{IndexStats, Indexer, IndexerConfig, TreeIndex};
pub use walker::Walker;

/// A file discovered by the walker.
///
/// `dir` is the containing directory exactly as the walk observed it, while
/// `path` is the symlink-resolved location of the file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Canonical (symlink-resolved) path to the file
    pub path: PathBuf,
    /// Containing directory as observed during the walk
    pub dir: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Whether the walked entry was a symbolic link
    pub is_symlink: bool,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, dir: PathBuf, size: u64) -> Self {
        Self {
            path,
            dir,
            size,
            is_symlink: false,
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into symlinked directories.
    /// Symlinks to files are always resolved regardless of this flag.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A symbolic link could not be resolved.
    #[error("Unresolvable link: {0}")]
    BrokenLink(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
