//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] reads a file through a fixed-size buffer and feeds every chunk
//! into an incremental BLAKE3 state, so arbitrarily large files are
//! fingerprinted in constant memory. The buffer size only affects speed,
//! never the resulting [`Digest`].
//!
//! [`Hasher::prehash`] digests only the first [`PREHASH_SIZE`] bytes and is
//! used to rule out same-size files cheaply. For files no larger than
//! [`PREHASH_SIZE`] the prehash equals the full hash.
//!
//! Files ruled out before the full hash get a [`unique_token`] instead of a
//! content digest. The token is derived from the file's canonical path and
//! size, so it never equals the digest of any other file.
//!
//! # Example
//!
//! ```no_run
//! use dupedirs::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.full_hash(Path::new("Cargo.toml")).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// Content fingerprint of a file: a 32-byte BLAKE3 hash.
pub type Digest = [u8; 32];

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Largest read buffer a hasher will allocate (64 MiB).
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Bytes read for a prehash (4 KiB).
pub const PREHASH_SIZE: usize = 4 * 1024;

const UNIQUE_TOKEN_CONTEXT: &str = "dupedirs 2024-06-01 unique file token";

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 64 KiB buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Create a hasher reading `size` bytes per chunk.
    ///
    /// The size is clamped to `1..=MAX_BUFFER_SIZE`.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Abort in-flight reads once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Current read buffer size in bytes.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the entire content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if a
    /// shutdown was requested mid-read.
    pub fn full_hash(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| map_io_error(path, e))?;
        self.hash_reader(path, file, self.buffer_size)
    }

    /// Hash the first [`PREHASH_SIZE`] bytes of the file at `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Hasher::full_hash`].
    pub fn prehash(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| map_io_error(path, e))?;
        let limit = self.buffer_size.min(PREHASH_SIZE);
        self.hash_reader(path, file.take(PREHASH_SIZE as u64), limit)
    }

    /// Check that the file at `path` can be opened for reading.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if opening fails.
    pub fn check_readable(&self, path: &Path) -> Result<(), HashError> {
        File::open(path)
            .map(drop)
            .map_err(|e| map_io_error(path, e))
    }

    /// Hash everything `reader` yields until end of stream.
    fn hash_reader<R: Read>(
        &self,
        path: &Path,
        mut reader: R,
        buffer_size: usize,
    ) -> Result<Digest, HashError> {
        let mut state = blake3::Hasher::new();
        let mut buffer = vec![0u8; buffer_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(path, e)),
            };
            state.update(&buffer[..n]);
        }

        Ok(*state.finalize().as_bytes())
    }
}

fn map_io_error(path: &Path, error: io::Error) -> HashError {
    match error.kind() {
        io::ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

/// Render a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Digest) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Stand-in digest for a file that shares its content with no other file.
///
/// Keyed on the canonical path and size: the same physical file reached
/// twice gets the same token, distinct files never share one.
#[must_use]
pub fn unique_token(canonical_path: &Path, size: u64) -> Digest {
    let mut material = size.to_le_bytes().to_vec();
    material.extend_from_slice(canonical_path.as_os_str().as_encoded_bytes());
    blake3::derive_key(UNIQUE_TOKEN_CONTEXT, &material)
}
