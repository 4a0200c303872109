//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! [`Walker`] enumerates every regular file reachable from a root and pairs
//! it with the directory it was found in. Children are sorted by name so
//! repeated walks over an unchanged tree yield the same sequence.
//!
//! Symlinks to files are resolved to their canonical target; the containing
//! directory keeps the path the walk observed. Dangling links surface as
//! [`ScanError::BrokenLink`] so the caller can skip them.
//!
//! # Example
//!
//! ```no_run
//! use dupedirs::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Photos"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Receives one notification per directory visited
    progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Number of directories visited so far
    dirs_visited: AtomicUsize,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
            dirs_visited: AtomicUsize::new(0),
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report each visited directory to `callback`.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Number of directories visited by the last walk.
    #[must_use]
    pub fn dirs_visited(&self) -> usize {
        self.dirs_visited.load(Ordering::Relaxed)
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn visit_directory(&self, path: &Path) {
        let count = self.dirs_visited.fetch_add(1, Ordering::Relaxed) + 1;
        log::trace!("Processing: {}", path.display());
        if let Some(ref callback) = self.progress_callback {
            callback.on_progress(count, &path.to_string_lossy());
        }
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Once shutdown is requested the iterator ends.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        self.dirs_visited.store(0, Ordering::Relaxed);

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    let path = entry.path();

                    if file_type.is_dir() {
                        self.visit_directory(&path);
                        return None;
                    }

                    let dir = path
                        .parent()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    self.process_file_entry(path, dir, file_type.is_symlink())
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(self.handle_jwalk_error(path, e))
                }
            })
    }

    /// Resolve a non-directory entry and keep it if it is a regular file.
    fn process_file_entry(
        &self,
        path: PathBuf,
        dir: PathBuf,
        is_symlink: bool,
    ) -> Option<Result<FileEntry, ScanError>> {
        let canonical = match std::fs::canonicalize(&path) {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && is_symlink => {
                log::debug!("Skipping dangling link: {}", path.display());
                return Some(Err(ScanError::BrokenLink(path)));
            }
            Err(e) => return Some(self.handle_io_error(&path, e)),
        };

        let metadata = match std::fs::metadata(&canonical) {
            Ok(m) => m,
            Err(e) => return Some(self.handle_io_error(&canonical, e)),
        };

        // Linked directories are only descended via follow_symlinks;
        // sockets, fifos and devices are never content.
        if !metadata.is_file() {
            log::trace!("Skipping non-regular entry: {}", path.display());
            return None;
        }

        Some(Ok(FileEntry {
            path: canonical,
            dir,
            size: metadata.len(),
            is_symlink,
        }))
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> Result<FileEntry, ScanError> {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                Err(ScanError::PermissionDenied(path.to_path_buf()))
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                Err(ScanError::NotFound(path.to_path_buf()))
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                Err(ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                })
            }
        }
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error(
        &self,
        path: PathBuf,
        error: jwalk::Error,
    ) -> Result<FileEntry, ScanError> {
        log::warn!("Walker error for {}: {}", path.display(), error);
        Err(ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        })
    }
}
