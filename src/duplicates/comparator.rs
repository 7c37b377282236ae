//! Deterministic original selection among equal-content files.
//!
//! # Overview
//!
//! The [`DuplicateComparator`] is built once from the ordered list of input
//! roots. A file's [`Rank`] is the index of the first listed root containing
//! it, then its full path in natural (human) order. The best-ranked file of a
//! duplicate set is the original; the others are reported in natural order.
//!
//! # Example
//!
//! ```
//! use pardupes::duplicates::DuplicateComparator;
//! use pardupes::scanner::FileEntry;
//! use std::path::PathBuf;
//!
//! let comparator = DuplicateComparator::new(&[PathBuf::from("/keep"), PathBuf::from("/scratch")]);
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/scratch/photo.jpg"), 10),
//!     FileEntry::new(PathBuf::from("/keep/photo10.jpg"), 10),
//!     FileEntry::new(PathBuf::from("/keep/photo9.jpg"), 10),
//! ];
//!
//! let (original, rest) = comparator.choose_original(files).unwrap();
//! assert_eq!(original.path, PathBuf::from("/keep/photo9.jpg"));
//! assert_eq!(rest[0].path, PathBuf::from("/keep/photo10.jpg"));
//! ```

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::scanner::FileEntry;

/// Priority of a path: lower ranks win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rank {
    /// Index of the first input root containing the path; roots.len() if none.
    pub root_index: usize,
    key: String,
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        self.root_index
            .cmp(&other.root_index)
            .then_with(|| natural_cmp(&self.key, &other.key))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ranks files by input root order, then by natural path order.
#[derive(Debug, Clone, Default)]
pub struct DuplicateComparator {
    /// Rank table: each input root (canonicalized when possible) in priority order.
    roots: Vec<PathBuf>,
}

impl DuplicateComparator {
    /// Build the rank table from the ordered input roots.
    #[must_use]
    pub fn new(roots: &[PathBuf]) -> Self {
        let roots = roots
            .iter()
            .map(|root| std::fs::canonicalize(root).unwrap_or_else(|_| root.clone()))
            .collect();
        Self { roots }
    }

    /// The canonical roots in priority order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Compute the rank of a path.
    #[must_use]
    pub fn rank(&self, path: &Path) -> Rank {
        let root_index = self
            .roots
            .iter()
            .position(|root| path.starts_with(root))
            .unwrap_or(self.roots.len());
        Rank {
            root_index,
            key: path.to_string_lossy().into_owned(),
        }
    }

    /// Compare two paths by rank.
    #[must_use]
    pub fn compare(&self, a: &Path, b: &Path) -> Ordering {
        self.rank(a)
            .cmp(&self.rank(b))
            .then_with(|| a.as_os_str().cmp(b.as_os_str()))
    }

    /// Split equal-content files into the original and the rest.
    ///
    /// The original is the best-ranked file; the rest are in natural-sort
    /// order. Returns `None` for an empty input.
    #[must_use]
    pub fn choose_original(&self, mut files: Vec<FileEntry>) -> Option<(FileEntry, Vec<FileEntry>)> {
        let best = files
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| self.compare(&a.path, &b.path))
            .map(|(idx, _)| idx)?;
        let original = files.swap_remove(best);
        sort_naturally(&mut files);
        Some((original, files))
    }
}

/// Sort file entries by natural path order.
pub fn sort_naturally(files: &mut [FileEntry]) {
    files.sort_by(|a, b| natural_path_cmp(&a.path, &b.path));
}

/// Natural order of two paths, falling back to raw bytes on ties.
#[must_use]
pub fn natural_path_cmp(a: &Path, b: &Path) -> Ordering {
    natural_cmp(&a.to_string_lossy(), &b.to_string_lossy())
        .then_with(|| a.as_os_str().cmp(b.as_os_str()))
}

/// Compare strings in natural order: digit runs by numeric value, the rest
/// by character.
///
/// `"file9"` sorts before `"file10"`. Numbers that are equal in value are
/// ordered by their length, so `"a01"` sorts after `"a1"`.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x_run = take_digits(&mut left);
                let y_run = take_digits(&mut right);
                let ordering = compare_digit_runs(&x_run, &y_run);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}
