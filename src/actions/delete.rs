//! Deletion of confirmed duplicates.
//!
//! # Overview
//!
//! [`delete_duplicates`] removes every duplicate of every set and never an
//! original:
//! - Paths that are the original of any set are excluded, even if they also
//!   appear as a duplicate elsewhere.
//! - Remaining paths are deleted in natural-sort order.
//! - A failure is logged and recorded; the batch continues.
//! - A file that is already gone counts as already removed, so re-running
//!   after a partial run is safe.
//!
//! Files are unlinked by default, or moved to the system trash with
//! [`DeleteConfig::trash`].
//!
//! # Example
//!
//! ```no_run
//! use pardupes::actions::delete::{delete_duplicates, DeleteConfig};
//!
//! let sets = Vec::new();
//! let result = delete_duplicates(&sets, &DeleteConfig::default());
//! assert!(result.nothing_to_do());
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::duplicates::{natural_path_cmp, DuplicateSet};

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether the file went to the trash.
    pub trashed: bool,
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Paths considered for deletion, after excluding originals.
    pub requested: usize,
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Files that were already gone.
    pub already_removed: Vec<PathBuf>,
    /// Failed deletions with their errors.
    pub failures: Vec<(PathBuf, String)>,
    /// Duplicate paths kept because they are the original of some set.
    pub protected: Vec<PathBuf>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of files deleted by this run.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether there was nothing to delete.
    #[must_use]
    pub fn nothing_to_do(&self) -> bool {
        self.requested == 0
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.nothing_to_do() {
            return "Nothing to delete".to_string();
        }
        let mut summary = format!(
            "Deleted {} file(s), freed {}",
            self.success_count(),
            bytesize::ByteSize(self.bytes_freed)
        );
        if !self.already_removed.is_empty() {
            summary.push_str(&format!(", {} already removed", self.already_removed.len()));
        }
        if !self.all_succeeded() {
            summary.push_str(&format!(", {} failed", self.failure_count()));
        }
        summary
    }
}

/// Configuration for deletion.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfig {
    /// Move files to the system trash instead of unlinking them.
    pub trash: bool,
}

impl DeleteConfig {
    /// Config that moves files to the trash.
    #[must_use]
    pub fn trash() -> Self {
        Self { trash: true }
    }

    /// Config that unlinks files.
    #[must_use]
    pub fn permanent() -> Self {
        Self { trash: false }
    }
}

/// Delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the trash backend rejects the file
pub fn delete_file(path: &Path, config: &DeleteConfig) -> Result<DeleteResult, DeleteError> {
    let size = fs::symlink_metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    if config.trash {
        trash::delete(path).map_err(|e| DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    } else {
        fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e))?;
        log::info!("Deleted: {} ({} bytes)", path.display(), size);
    }

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        trashed: config.trash,
    })
}

/// Delete every duplicate of every set, never touching an original.
///
/// # Example
///
/// ```no_run
/// use pardupes::actions::delete::{delete_duplicates, DeleteConfig};
/// use pardupes::duplicates::DuplicateSet;
///
/// let sets: Vec<DuplicateSet> = Vec::new();
/// let result = delete_duplicates(&sets, &DeleteConfig::trash());
/// println!("{}", result.summary());
/// ```
pub fn delete_duplicates(sets: &[DuplicateSet], config: &DeleteConfig) -> BatchDeleteResult {
    let originals: HashSet<&Path> = sets.iter().map(|s| s.original.path.as_path()).collect();

    let mut result = BatchDeleteResult::default();
    let mut seen: HashSet<&Path> = HashSet::new();
    let mut paths: Vec<&Path> = Vec::new();
    for dup in sets.iter().flat_map(|s| &s.duplicates) {
        let path = dup.path.as_path();
        if !seen.insert(path) {
            continue;
        }
        if originals.contains(path) {
            log::warn!("Not deleting {}: it is the original of another set", path.display());
            result.protected.push(path.to_path_buf());
            continue;
        }
        paths.push(path);
    }
    paths.sort_by(|a, b| natural_path_cmp(a, b));
    result.requested = paths.len();

    if paths.is_empty() {
        log::info!("Nothing to delete");
        return result;
    }

    for path in paths {
        match delete_file(path, config) {
            Ok(deleted) => {
                result.bytes_freed += deleted.size;
                result.successes.push(deleted);
            }
            Err(DeleteError::NotFound(_)) => {
                log::debug!("Already removed: {}", path.display());
                result.already_removed.push(path.to_path_buf());
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Failed to delete {}: {}", path.display(), message);
                result.failures.push((path.to_path_buf(), message));
            }
        }
    }

    log::info!("{}", result.summary());
    result
}
