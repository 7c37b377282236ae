//! Duplicate detection inside a single size group.
//!
//! # Overview
//!
//! [`DupeFinder::find`] turns one size group into confirmed
//! [`DuplicateSet`]s:
//!
//! 1. **Fingerprint**: every file is fingerprinted on the shared [`IoPool`].
//!    Each file advances progress exactly once here, whether the read
//!    succeeds or not. Unreadable files are dropped for this run.
//! 2. **Bucket**: files are bucketed by fingerprint; singleton buckets are
//!    discarded.
//! 3. **Confirm**: when the fingerprint only sampled the file, every member
//!    of a bucket is hashed in full and re-bucketed. In paranoid mode each
//!    bucket is further split by byte-for-byte comparison.
//! 4. **Rank**: the [`DuplicateComparator`] picks the original of each
//!    confirmed bucket.
//!
//! # Example
//!
//! ```no_run
//! use pardupes::duplicates::{DuplicateComparator, DupeFinder};
//! use pardupes::pool::IoPool;
//! use pardupes::progress::ProgressTracker;
//! use pardupes::scanner::{traverse, TraverseConfig};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! let roots = vec![PathBuf::from(".")];
//! let traversal = traverse(&roots, &TraverseConfig::default()).unwrap();
//! let finder = DupeFinder::new(
//!     Arc::new(IoPool::new(4).unwrap()),
//!     Arc::new(DuplicateComparator::new(&roots)),
//!     Arc::new(ProgressTracker::hidden()),
//! );
//!
//! for group in traversal.groups {
//!     for set in finder.find(group.size, group.files) {
//!         println!("{} has {} duplicates", set.original.path.display(), set.duplicate_count());
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{DuplicateComparator, DuplicateSet};
use crate::pool::IoPool;
use crate::progress::ProgressTracker;
use crate::scanner::hasher::Hash;
use crate::scanner::{FileEntry, HashError, Hasher};

/// Finds duplicates within size groups.
///
/// Shared by every outer worker; all reads go through the shared [`IoPool`].
#[derive(Debug)]
pub struct DupeFinder {
    io: Arc<IoPool>,
    comparator: Arc<DuplicateComparator>,
    progress: Arc<ProgressTracker>,
    hasher: Hasher,
    paranoid: bool,
    read_errors: AtomicUsize,
}

impl DupeFinder {
    /// Create a finder with the default hasher.
    #[must_use]
    pub fn new(
        io: Arc<IoPool>,
        comparator: Arc<DuplicateComparator>,
        progress: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            io,
            comparator,
            progress,
            hasher: Hasher::new(),
            paranoid: false,
            read_errors: AtomicUsize::new(0),
        }
    }

    /// Use a hasher with custom sampling parameters.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Hasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Enable byte-for-byte confirmation after hashing.
    #[must_use]
    pub fn with_paranoid(mut self, paranoid: bool) -> Self {
        self.paranoid = paranoid;
        self
    }

    /// Files dropped so far because they could not be read.
    #[must_use]
    pub fn read_errors(&self) -> usize {
        self.read_errors.load(Ordering::Relaxed)
    }

    /// Find the duplicate sets among `files`, all of which are `size` bytes.
    ///
    /// Sets come back in no particular order; within a set the duplicates
    /// are in natural-sort order.
    #[must_use]
    pub fn find(&self, size: u64, files: Vec<FileEntry>) -> Vec<DuplicateSet> {
        if files.len() < 2 {
            let count = files.len() as u64;
            self.progress.advance(count, count * size);
            return Vec::new();
        }
        let file_count = files.len();

        let fingerprints = self.io.map(files, |file| {
            let result = self.hasher.fingerprint(&file.path, size);
            self.progress.advance(1, size);
            match result {
                Ok(fingerprint) => Some((fingerprint, file)),
                Err(e) => {
                    self.note_read_error(&e);
                    None
                }
            }
        });
        let mut buckets = bucket_by_hash(fingerprints.into_iter().flatten());

        if !self.hasher.covers_whole_file(size) {
            buckets = buckets
                .into_iter()
                .flat_map(|bucket| self.confirm_by_full_hash(size, bucket))
                .collect();
        }
        if self.paranoid {
            buckets = buckets
                .into_iter()
                .flat_map(|bucket| self.split_identical(bucket))
                .collect();
        }

        let sets: Vec<DuplicateSet> = buckets
            .into_iter()
            .filter_map(|bucket| {
                let (original, rest) = self.comparator.choose_original(bucket)?;
                DuplicateSet::new(original, rest)
            })
            .collect();
        if !sets.is_empty() {
            log::debug!(
                "Size {}: {} files, {} duplicate sets",
                size,
                file_count,
                sets.len()
            );
        }
        sets
    }

    /// Re-bucket by whole-content BLAKE3.
    fn confirm_by_full_hash(&self, size: u64, bucket: Vec<FileEntry>) -> Vec<Vec<FileEntry>> {
        let hashed = self.io.map(bucket, |file| {
            match self.hasher.full_hash(&file.path, size) {
                Ok(hash) => Some((hash, file)),
                Err(e) => {
                    self.note_read_error(&e);
                    None
                }
            }
        });
        bucket_by_hash(hashed.into_iter().flatten())
    }

    /// Split a bucket into runs of byte-identical files.
    fn split_identical(&self, bucket: Vec<FileEntry>) -> Vec<Vec<FileEntry>> {
        let mut confirmed = Vec::new();
        let mut remaining = bucket;
        while remaining.len() >= 2 {
            let head = remaining.remove(0);
            let candidates = std::mem::take(&mut remaining);
            let compared = self.io.map(candidates, |file| {
                (self.hasher.files_identical(&head.path, &file.path), file)
            });

            // An unreadable head says nothing about the others: drop only it.
            let head_error = compared.iter().find_map(|(result, _)| match result {
                Err(e) if e.path() == head.path.as_path() => Some(e),
                _ => None,
            });
            if let Some(e) = head_error {
                self.note_read_error(e);
                for (result, file) in compared {
                    match result {
                        Err(e) if e.path() != head.path.as_path() => self.note_read_error(&e),
                        _ => remaining.push(file),
                    }
                }
                continue;
            }

            let mut same = vec![head];
            for (result, file) in compared {
                match result {
                    Ok(true) => same.push(file),
                    Ok(false) => remaining.push(file),
                    Err(e) => self.note_read_error(&e),
                }
            }
            if same.len() >= 2 {
                confirmed.push(same);
            }
        }
        confirmed
    }

    fn note_read_error(&self, error: &HashError) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
        match error {
            HashError::NotFound(path) => {
                log::debug!("File vanished before it could be read: {}", path.display());
            }
            _ => log::warn!("Skipping unreadable file: {}", error),
        }
    }
}

/// Group entries by digest, keeping only buckets of two or more.
fn bucket_by_hash(entries: impl Iterator<Item = (Hash, FileEntry)>) -> Vec<Vec<FileEntry>> {
    let mut buckets: HashMap<Hash, Vec<FileEntry>> = HashMap::new();
    for (hash, file) in entries {
        buckets.entry(hash).or_default().push(file);
    }
    buckets.into_values().filter(|b| b.len() >= 2).collect()
}
