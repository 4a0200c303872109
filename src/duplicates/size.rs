//! Recursive disk usage of a directory subtree.

use std::path::Path;

use walkdir::WalkDir;

/// Bytes per binary megabyte.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Total size in bytes of every regular file under `dir`, recursively.
///
/// Entries that cannot be read contribute nothing; symlinks are not
/// followed.
#[must_use]
pub fn subtree_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("Size walk skipped entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Convert bytes to binary megabytes.
#[must_use]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}
