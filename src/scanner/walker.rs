//! Metadata-only traversal of one or more roots using jwalk.
//!
//! # Overview
//!
//! [`traverse`] walks every input root, stats each regular file once, and
//! partitions the files into [`SizeGroup`]s. No file content is read here.
//!
//! - Roots are validated up front. A missing root or a root that is not a
//!   directory is fatal.
//! - Roots are canonicalized. A root listed twice, or nested inside another
//!   root, is walked once so no file is recorded twice.
//! - Symlinks are never followed. Symlinks and non-regular files are skipped.
//! - Files below `min_size` are only counted in the [`SkipTally`].
//! - Per-entry failures are logged and counted, never fatal.
//!
//! Stat calls run inside jwalk's directory-reading callback, so with
//! `concurrency > 1` they run on the walk's own rayon pool. The size table
//! behind a mutex is the only structure those workers share.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use jwalk::{Parallelism, WalkDir};

use super::{FileEntry, ScanError, TraverseConfig};
use crate::duplicates::{GroupingStats, SizeGroup};

/// Files seen during traversal but below the minimum size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipTally {
    /// Number of skipped files
    pub files: u64,
    /// Total bytes of skipped files
    pub bytes: u64,
}

/// Result of walking all roots.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    /// Every size group found, singletons included, in no particular order
    pub groups: Vec<SizeGroup>,
    /// Files in groups with 2+ members
    pub candidate_files: u64,
    /// Bytes in groups with 2+ members
    pub candidate_bytes: u64,
    /// Files below the minimum size
    pub skipped: SkipTally,
    /// Entries that could not be read or stat'ed
    pub errors: usize,
}

impl Traversal {
    /// Build a traversal result from groups, computing candidate totals.
    #[must_use]
    pub fn from_groups(groups: Vec<SizeGroup>, skipped: SkipTally, errors: usize) -> Self {
        let stats = GroupingStats::from_groups(&groups);
        Self {
            groups,
            candidate_files: stats.candidate_files as u64,
            candidate_bytes: stats.candidate_bytes,
            skipped,
            errors,
        }
    }

    /// Move groups below `min_size` into the skip tally and recompute the
    /// candidate totals from what remains.
    #[must_use]
    pub fn filter_min_size(self, min_size: u64) -> Self {
        let mut skipped = self.skipped;
        let (kept, dropped): (Vec<SizeGroup>, Vec<SizeGroup>) =
            self.groups.into_iter().partition(|g| g.size >= min_size);
        for group in &dropped {
            skipped.files += group.len() as u64;
            skipped.bytes += group.total_size();
        }
        Self::from_groups(kept, skipped, self.errors)
    }

    /// Total number of files recorded in size groups.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.groups.iter().map(SizeGroup::len).sum()
    }
}

/// Shared accumulators touched by the directory-reading callbacks.
#[derive(Default)]
struct WalkState {
    by_size: Mutex<HashMap<u64, Vec<FileEntry>>>,
    skipped_files: AtomicU64,
    skipped_bytes: AtomicU64,
    errors: AtomicUsize,
}

impl WalkState {
    fn record(&self, path: PathBuf, size: u64, min_size: u64) {
        if size < min_size {
            log::trace!("Below minimum size ({} bytes): {}", size, path.display());
            self.skipped_files.fetch_add(1, Ordering::Relaxed);
            self.skipped_bytes.fetch_add(size, Ordering::Relaxed);
            return;
        }
        self.by_size
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(size)
            .or_default()
            .push(FileEntry::new(path, size));
    }

    fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// Walk `roots` and partition their regular files into size groups.
///
/// # Arguments
///
/// * `roots` - Directories to walk, in priority order
/// * `config` - Concurrency, minimum size and shutdown flag
///
/// # Errors
///
/// Returns [`ScanError::NotFound`] or [`ScanError::NotADirectory`] for a bad
/// root, and [`ScanError::Interrupted`] if shutdown is requested mid-walk.
///
/// # Example
///
/// ```no_run
/// use pardupes::scanner::{traverse, TraverseConfig};
/// use std::path::PathBuf;
///
/// let config = TraverseConfig::default().with_concurrency(8);
/// let traversal = traverse(&[PathBuf::from("/mnt/archive")], &config).unwrap();
/// println!("{} candidate files", traversal.candidate_files);
/// ```
pub fn traverse(roots: &[PathBuf], config: &TraverseConfig) -> Result<Traversal, ScanError> {
    let roots = walk_roots(roots)?;
    let state = Arc::new(WalkState::default());

    for root in &roots {
        log::debug!("Walking {}", root.display());
        walk_root(root, config, &state)?;
    }

    let by_size = std::mem::take(&mut *state.by_size.lock().unwrap_or_else(PoisonError::into_inner));
    let groups: Vec<SizeGroup> = by_size
        .into_iter()
        .map(|(size, files)| SizeGroup::with_files(size, files))
        .collect();
    let skipped = SkipTally {
        files: state.skipped_files.load(Ordering::Relaxed),
        bytes: state.skipped_bytes.load(Ordering::Relaxed),
    };
    let errors = state.errors.load(Ordering::Relaxed);

    let traversal = Traversal::from_groups(groups, skipped, errors);
    log::info!(
        "Traversal found {} files in {} size groups ({} candidates, {} below minimum size, {} errors)",
        traversal.total_files(),
        traversal.groups.len(),
        traversal.candidate_files,
        skipped.files,
        errors
    );
    Ok(traversal)
}

/// Validate and canonicalize roots, dropping repeats and nested roots.
fn walk_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut canonical = Vec::with_capacity(roots.len());
    for root in roots {
        let metadata =
            std::fs::metadata(root).map_err(|e| ScanError::from_io(root.clone(), e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(root.clone()));
        }
        // A root that cannot be listed fails the run instead of yielding nothing.
        std::fs::read_dir(root).map_err(|e| ScanError::from_io(root.clone(), e))?;
        let path = std::fs::canonicalize(root).map_err(|e| ScanError::from_io(root.clone(), e))?;
        canonical.push(path);
    }

    let mut selected: Vec<PathBuf> = Vec::with_capacity(canonical.len());
    for (idx, root) in canonical.iter().enumerate() {
        let repeated = canonical[..idx].contains(root);
        let nested = canonical
            .iter()
            .any(|other| other != root && root.starts_with(other));
        if repeated || nested {
            log::debug!("Root already covered by another root: {}", root.display());
            continue;
        }
        selected.push(root.clone());
    }
    Ok(selected)
}

fn walk_root(root: &Path, config: &TraverseConfig, state: &Arc<WalkState>) -> Result<(), ScanError> {
    let parallelism = if config.concurrency <= 1 {
        Parallelism::Serial
    } else {
        Parallelism::RayonNewPool(config.concurrency)
    };

    let min_size = config.min_size;
    let callback_state = Arc::clone(state);
    let walk = WalkDir::new(root)
        .follow_links(false)
        .skip_hidden(false)
        .parallelism(parallelism)
        .process_read_dir(move |_depth, _dir, _read_dir_state, children| {
            for child in children.iter() {
                let Ok(entry) = child else { continue };
                let file_type = entry.file_type();
                if file_type.is_dir() {
                    continue;
                }
                let path = entry.path();
                if file_type.is_symlink() {
                    log::trace!("Skipping symlink: {}", path.display());
                    continue;
                }
                if !file_type.is_file() {
                    log::trace!("Skipping special file: {}", path.display());
                    continue;
                }
                match std::fs::symlink_metadata(&path) {
                    Ok(metadata) if metadata.is_file() => {
                        callback_state.record(path, metadata.len(), min_size);
                    }
                    Ok(_) => log::trace!("No longer a regular file: {}", path.display()),
                    Err(e) => {
                        log::warn!("Cannot stat {}: {}", path.display(), e);
                        callback_state.error();
                    }
                }
            }
            // Files are recorded; only directories and errors need to flow on.
            children.retain(|child| child.as_ref().map_or(true, |e| e.file_type().is_dir()));
        });

    for entry in walk {
        if config
            .shutdown_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
        {
            log::debug!("Shutdown requested, stopping traversal of {}", root.display());
            return Err(ScanError::Interrupted);
        }
        if let Err(e) = entry {
            let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
            log::warn!("Cannot read {}: {}", path.display(), e);
            state.error();
        }
    }
    Ok(())
}
