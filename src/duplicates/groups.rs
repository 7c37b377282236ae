//! Size groups and confirmed duplicate sets.
//!
//! # Overview
//!
//! Size grouping is the first phase of duplicate detection: files with
//! different sizes cannot be duplicates, so every later phase works inside a
//! single [`SizeGroup`]. Confirmed results are reported as [`DuplicateSet`]s.
//!
//! # Example
//!
//! ```
//! use pardupes::scanner::FileEntry;
//! use pardupes::duplicates::{group_by_size, GroupingStats};
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.candidate_files, 2);  // Two 1024-byte files
//! assert_eq!(groups.len(), 2);           // Singletons are kept for inspection
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::scanner::FileEntry;

/// A group of files with the same size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size
    pub files: Vec<FileEntry>,
}

impl SizeGroup {
    /// Create a new, empty size group.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            files: Vec::new(),
        }
    }

    /// Create a size group with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileEntry>) -> Self {
        Self { size, files }
    }

    /// Add a file to this group.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if file size doesn't match group size.
    pub fn add(&mut self, file: FileEntry) {
        debug_assert_eq!(
            file.size, self.size,
            "File size {} doesn't match group size {}",
            file.size, self.size
        );
        self.files.push(file);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if this group can contain duplicates (2+ files).
    #[must_use]
    pub fn is_candidate(&self) -> bool {
        self.files.len() > 1
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }
}

/// Statistics from size grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Files that entered grouping
    pub total_files: usize,
    /// Distinct sizes seen
    pub distinct_sizes: usize,
    /// Files in groups with 2+ members
    pub candidate_files: usize,
    /// Bytes in groups with 2+ members
    pub candidate_bytes: u64,
}

impl GroupingStats {
    /// Compute candidate totals over a set of groups.
    #[must_use]
    pub fn from_groups(groups: &[SizeGroup]) -> Self {
        let mut stats = Self {
            distinct_sizes: groups.len(),
            ..Self::default()
        };
        for group in groups {
            stats.total_files += group.len();
            if group.is_candidate() {
                stats.candidate_files += group.len();
                stats.candidate_bytes += group.total_size();
            }
        }
        stats
    }

    /// Percentage of files eliminated by size alone.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            let eliminated = self.total_files - self.candidate_files;
            (eliminated as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Partition files into size groups.
///
/// Every file lands in exactly one group; groups are returned in no
/// particular order.
#[must_use]
pub fn group_by_size(files: Vec<FileEntry>) -> (Vec<SizeGroup>, GroupingStats) {
    let mut by_size: HashMap<u64, SizeGroup> = HashMap::new();
    for file in files {
        by_size
            .entry(file.size)
            .or_insert_with(|| SizeGroup::new(file.size))
            .add(file);
    }
    let groups: Vec<SizeGroup> = by_size.into_values().collect();
    let stats = GroupingStats::from_groups(&groups);
    (groups, stats)
}

/// A set of byte-identical files: one original plus its duplicates.
///
/// The original is never part of `duplicates`, and `duplicates` is never
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSet {
    /// Size shared by every file in the set
    pub size: u64,
    /// The file to keep
    pub original: FileEntry,
    /// Files with the same content as `original`, in natural-sort order
    pub duplicates: Vec<FileEntry>,
}

impl DuplicateSet {
    /// Build a set, or `None` when there are no duplicates.
    #[must_use]
    pub fn new(original: FileEntry, duplicates: Vec<FileEntry>) -> Option<Self> {
        if duplicates.is_empty() {
            return None;
        }
        debug_assert!(duplicates.iter().all(|d| d.path != original.path));
        Some(Self {
            size: original.size,
            original,
            duplicates,
        })
    }

    /// Number of duplicates (excluding the original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Bytes that removing the duplicates would free.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicates.len() as u64
    }

    /// Iterate `(original, duplicate)` path pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&std::path::Path, &std::path::Path)> + '_ {
        self.duplicates
            .iter()
            .map(move |d| (self.original.path.as_path(), d.path.as_path()))
    }
}
