//! Scanner module for directory traversal and file fingerprinting.
//!
//! This module provides functionality for:
//! - Metadata-only traversal of one or more roots using jwalk
//! - Partitioning discovered files into size groups
//! - Sampled BLAKE3 fingerprints and whole-file BLAKE3 confirmation
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and size grouping
//! - [`hasher`]: Fingerprints, full hashes and byte comparison
//!
//! # Example
//!
//! ```no_run
//! use pardupes::scanner::{traverse, TraverseConfig};
//! use std::path::PathBuf;
//!
//! let config = TraverseConfig {
//!     min_size: 1024, // Skip files under 1KB
//!     ..Default::default()
//! };
//!
//! let traversal = traverse(&[PathBuf::from(".")], &config).unwrap();
//! for group in &traversal.groups {
//!     println!("{} bytes: {} files", group.size, group.len());
//! }
//! ```

pub mod hasher;
pub mod walker;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

// Re-export main types
pub use hasher::{hash_to_hex, Fingerprint, Hasher, SAMPLE_SIZE, SAMPLING_THRESHOLD};
pub use walker::{traverse, SkipTally, Traversal};

/// A regular file discovered during traversal.
///
/// Immutable once recorded; owned by the size group that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Configuration for traversal.
#[derive(Debug, Clone)]
pub struct TraverseConfig {
    /// Number of parallel directory readers. `1` walks serially.
    pub concurrency: usize,

    /// Minimum file size to record in a size group (in bytes).
    /// Smaller files only contribute to the skip tally.
    pub min_size: u64,

    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for TraverseConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            min_size: 1,
            shutdown_flag: None,
        }
    }
}

impl TraverseConfig {
    /// Set the traversal concurrency (clamped to at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
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

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The traversal was stopped by a shutdown request.
    #[error("Traversal interrupted")]
    Interrupted,

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

impl ScanError {
    /// Classify an I/O error for the given path.
    pub(crate) fn from_io(path: PathBuf, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io {
                path,
                source: error,
            },
        }
    }
}

/// Errors that can occur while reading file content.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The file no longer has the size it was grouped under.
    #[error("File changed size since traversal: {path} ({expected} -> {actual} bytes)")]
    SizeChanged {
        /// Path of the file
        path: PathBuf,
        /// Size recorded during traversal
        expected: u64,
        /// Size observed while reading
        actual: u64,
    },

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

impl HashError {
    /// The file the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) => path,
            Self::SizeChanged { path, .. } | Self::Io { path, .. } => path,
        }
    }

    /// Classify an I/O error for the given path.
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
