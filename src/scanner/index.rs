//! Tree indexer: per-directory content lists and digest representatives.
//!
//! # Overview
//!
//! [`Indexer::index`] walks each root, fingerprints every regular file and
//! records the digest under the directory the walk found it in. Files that
//! cannot be resolved or read are skipped without aborting the run, so a
//! directory only appears in the [`TreeIndex`] once at least one of its own
//! files was fingerprinted.
//!
//! Fingerprinting narrows candidates in three phases:
//! 1. **Size** - a file whose size no other file has is content-unique
//! 2. **Prehash** - same-size files are hashed over their first
//!    [`PREHASH_SIZE`] bytes; a unique `(size, prehash)` is content-unique
//! 3. **Full hash** - only files still sharing a prehash are read in full
//!
//! Content-unique files are recorded under a [`unique_token`] rather than a
//! content digest, so their directories still never match any other.
//!
//! Hashing runs on a bounded rayon pool; the results are merged by a single
//! owner in walk order, which keeps the index identical between runs over an
//! unchanged tree.
//!
//! # Example
//!
//! ```no_run
//! use dupedirs::scanner::{Indexer, IndexerConfig};
//! use std::path::PathBuf;
//!
//! let indexer = Indexer::new(IndexerConfig::default());
//! let (index, stats) = indexer.index(&[PathBuf::from("/data")]).unwrap();
//! println!("{} directories hold {} files", index.len(), stats.files_indexed);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::{
    unique_token, Digest, FileEntry, HashError, Hasher, Walker, WalkerConfig, MAX_BUFFER_SIZE,
    PREHASH_SIZE,
};
use crate::duplicates::FinderError;
use crate::progress::{ProgressCallback, PHASE_HASHING, PHASE_INDEXING, PHASE_PREHASHING};

/// Per-directory digest lists plus one representative path per digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeIndex {
    contents: BTreeMap<PathBuf, Vec<Digest>>,
    representatives: HashMap<Digest, PathBuf>,
}

impl TreeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` with `digest` lives directly inside `dir`.
    ///
    /// The file becomes the representative for `digest`, replacing any
    /// earlier one.
    pub fn insert(&mut self, dir: PathBuf, file: PathBuf, digest: Digest) {
        self.contents.entry(dir).or_default().push(digest);
        self.representatives.insert(digest, file);
    }

    /// Digests of the files directly inside `dir`, in indexing order.
    #[must_use]
    pub fn contents(&self, dir: &Path) -> Option<&[Digest]> {
        self.contents.get(dir).map(Vec::as_slice)
    }

    /// All indexed directories, sorted by path.
    pub fn directories(&self) -> impl Iterator<Item = (&Path, &[Digest])> {
        self.contents
            .iter()
            .map(|(dir, digests)| (dir.as_path(), digests.as_slice()))
    }

    /// The last indexed file carrying `digest`.
    #[must_use]
    pub fn representative(&self, digest: &Digest) -> Option<&Path> {
        self.representatives.get(digest).map(PathBuf::as_path)
    }

    /// Number of directories with at least one indexed file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    /// Whether no file was indexed at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Number of distinct digests seen.
    #[must_use]
    pub fn unique_digests(&self) -> usize {
        self.representatives.len()
    }

    /// Total number of indexed file records.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.contents.values().map(Vec::len).sum()
    }
}

/// Counters collected while indexing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Roots walked
    pub roots: usize,
    /// Directories visited by the walk
    pub directories_visited: usize,
    /// Regular files discovered
    pub files_seen: usize,
    /// Files successfully fingerprinted and recorded
    pub files_indexed: usize,
    /// Entries skipped because they could not be resolved or read
    pub files_skipped: usize,
    /// Files ruled out by a size no other file has
    pub files_unique_size: usize,
    /// Files ruled out by a prehash no other same-size file has
    pub files_unique_prehash: usize,
    /// Files read in full
    pub files_full_hashed: usize,
}

/// Configuration for the tree indexer.
#[derive(Clone)]
pub struct IndexerConfig {
    /// Number of worker threads for fingerprinting.
    pub io_threads: usize,
    /// Read buffer size handed to the hasher.
    pub buffer_size: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for IndexerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexerConfig")
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

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            buffer_size: super::DEFAULT_BUFFER_SIZE,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl IndexerConfig {
    /// Set the number of fingerprinting threads (at least one).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the hasher read buffer size, clamped to `1..=MAX_BUFFER_SIZE`.
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

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Walks roots and builds a [`TreeIndex`].
#[derive(Debug)]
pub struct Indexer {
    config: IndexerConfig,
    hasher: Hasher,
}

impl Indexer {
    /// Create a new indexer.
    #[must_use]
    pub fn new(config: IndexerConfig) -> Self {
        let mut hasher = Hasher::new().with_buffer_size(config.buffer_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self { config, hasher }
    }

    /// Create an indexer with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(IndexerConfig::default())
    }

    /// Index every regular file under `roots`.
    ///
    /// Roots are made absolute and lexically normalized (`.` dropped, `..`
    /// folded into its parent) but symlinks are not resolved; directory keys
    /// in the returned index are the walk's own view of each directory.
    /// Duplicate and overlapping roots are walked as given.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] if a root does not exist or is not a
    /// directory, or if shutdown was requested.
    pub fn index(&self, roots: &[PathBuf]) -> Result<(TreeIndex, IndexStats), FinderError> {
        let mut stats = IndexStats {
            roots: roots.len(),
            ..IndexStats::default()
        };

        let roots = roots
            .iter()
            .map(|root| resolve_root(root))
            .collect::<Result<Vec<_>, _>>()?;

        let files = self.discover(&roots, &mut stats)?;
        let digests = self.fingerprint(&files, &mut stats)?;

        let mut index = TreeIndex::new();
        for (file, digest) in files.into_iter().zip(digests) {
            match digest {
                Some(digest) => {
                    index.insert(file.dir, file.path, digest);
                    stats.files_indexed += 1;
                }
                None => stats.files_skipped += 1,
            }
        }

        log::info!(
            "Indexed {} files in {} directories ({} skipped)",
            stats.files_indexed,
            index.len(),
            stats.files_skipped
        );
        log::debug!(
            "{} unique by size, {} unique by prehash, {} hashed in full",
            stats.files_unique_size,
            stats.files_unique_prehash,
            stats.files_full_hashed
        );
        Ok((index, stats))
    }

    /// Walk every root in order and collect the files to fingerprint.
    fn discover(
        &self,
        roots: &[PathBuf],
        stats: &mut IndexStats,
    ) -> Result<Vec<FileEntry>, FinderError> {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_phase_start(PHASE_INDEXING, 0);
        }

        let mut files = Vec::new();
        for root in roots {
            log::info!("Indexing {}", root.display());
            let mut walker = Walker::new(root, self.config.walker_config.clone());
            if let Some(ref flag) = self.config.shutdown_flag {
                walker = walker.with_shutdown_flag(flag.clone());
            }
            if let Some(ref cb) = self.config.progress_callback {
                walker = walker.with_progress_callback(cb.clone());
            }

            for entry in walker.walk() {
                match entry {
                    Ok(file) => files.push(file),
                    Err(e) => {
                        log::debug!("Skipping entry: {}", e);
                        stats.files_skipped += 1;
                    }
                }
            }
            stats.directories_visited += walker.dirs_visited();

            if self.config.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }
        }
        stats.files_seen = files.len() + stats.files_skipped;

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_phase_end(PHASE_INDEXING);
        }
        Ok(files)
    }

    /// Fingerprint `files`, preserving input order.
    ///
    /// `None` marks a file that could not be read.
    fn fingerprint(
        &self,
        files: &[FileEntry],
        stats: &mut IndexStats,
    ) -> Result<Vec<Option<Digest>>, FinderError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
            .map_err(|e| FinderError::ThreadPool(e.to_string()))?;

        let mut digests: Vec<Option<Digest>> = vec![None; files.len()];

        // Phase 1: sizes
        let mut size_counts: HashMap<u64, usize> = HashMap::new();
        for file in files {
            *size_counts.entry(file.size).or_default() += 1;
        }
        let lone: Vec<bool> = files
            .iter()
            .map(|file| size_counts.get(&file.size) == Some(&1))
            .collect();

        // Phase 2: prehash same-size files; lone ones only need to be readable
        let jobs: Vec<usize> = (0..files.len()).collect();
        let prehashed = self.run_phase(&pool, PHASE_PREHASHING, files, &jobs, |i, file| {
            if lone[i] {
                self.hasher
                    .check_readable(&file.path)
                    .map(|()| unique_token(&file.path, file.size))
            } else {
                self.hasher.prehash(&file.path)
            }
        })?;

        let mut by_prehash: HashMap<(u64, Digest), Vec<usize>> = HashMap::new();
        for (i, result) in prehashed {
            match result {
                Some(digest) if lone[i] => {
                    digests[i] = Some(digest);
                    stats.files_unique_size += 1;
                }
                Some(prehash) => by_prehash
                    .entry((files[i].size, prehash))
                    .or_default()
                    .push(i),
                None => {}
            }
        }

        let mut full = Vec::new();
        for ((size, prehash), members) in by_prehash {
            if members.len() == 1 {
                let i = members[0];
                digests[i] = Some(unique_token(&files[i].path, size));
                stats.files_unique_prehash += 1;
            } else if size <= PREHASH_SIZE as u64 {
                // The prehash already covered the whole file.
                for i in members {
                    digests[i] = Some(prehash);
                }
            } else {
                full.extend(members);
            }
        }
        full.sort_unstable();

        // Phase 3: full hash
        stats.files_full_hashed = full.len();
        let hashed = self.run_phase(&pool, PHASE_HASHING, files, &full, |_, file| {
            self.hasher.full_hash(&file.path)
        })?;
        for (i, result) in hashed {
            digests[i] = result;
        }

        Ok(digests)
    }

    /// Run `work` over `files[jobs]` on `pool`, reporting progress as `phase`.
    fn run_phase<F>(
        &self,
        pool: &rayon::ThreadPool,
        phase: &str,
        files: &[FileEntry],
        jobs: &[usize],
        work: F,
    ) -> Result<Vec<(usize, Option<Digest>)>, FinderError>
    where
        F: Fn(usize, &FileEntry) -> Result<Digest, HashError> + Sync,
    {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_phase_start(phase, jobs.len());
        }

        let done = AtomicUsize::new(0);
        let results: Vec<(usize, Option<Digest>)> = pool.install(|| {
            jobs.par_iter()
                .map(|&i| {
                    let file = &files[i];
                    if self.config.is_shutdown_requested() {
                        return (i, None);
                    }

                    let result = work(i, file);
                    let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_progress(current, &file.path.to_string_lossy());
                    }

                    match result {
                        Ok(digest) => (i, Some(digest)),
                        Err(e) => {
                            log::debug!("Skipping unreadable file: {}", e);
                            (i, None)
                        }
                    }
                })
                .collect()
        });

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_phase_end(phase);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        Ok(results)
    }
}

/// Make a root absolute, check that it is a walkable directory and
/// normalize it.
fn resolve_root(root: &Path) -> Result<PathBuf, FinderError> {
    let absolute = std::path::absolute(root).map_err(|source| FinderError::IoWithPath {
        path: root.to_path_buf(),
        source,
    })?;

    match std::fs::metadata(&absolute) {
        Ok(meta) if meta.is_dir() => Ok(normalize_lexically(&absolute)),
        Ok(_) => Err(FinderError::NotADirectory(absolute)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FinderError::PathNotFound(absolute))
        }
        Err(source) => Err(FinderError::IoWithPath {
            path: absolute,
            source,
        }),
    }
}

/// Drop `.` components and fold each `..` into the component before it.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
