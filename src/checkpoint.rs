//! Traversal checkpoints.
//!
//! A checkpoint is the output of a traversal (size groups plus the candidate
//! totals) written to disk so a later run can skip the walk. It is stored as
//! a JSON envelope carrying a SHA-256 checksum of the compact checkpoint JSON,
//! gzip-compressed when the file name ends in `.gz`.
//!
//! Loading either reproduces the saved groups exactly or fails; a damaged
//! file never yields a partial result.
//!
//! # Example
//!
//! ```no_run
//! use pardupes::checkpoint::Checkpoint;
//! use std::path::Path;
//!
//! match Checkpoint::load(Path::new("walk.json.gz")) {
//!     Ok(Some(checkpoint)) => println!("{} size groups", checkpoint.groups.len()),
//!     Ok(None) => println!("no checkpoint yet"),
//!     Err(e) => eprintln!("unusable checkpoint: {}", e),
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::duplicates::SizeGroup;
use crate::scanner::{SkipTally, Traversal};

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Errors reading or writing a checkpoint.
#[derive(thiserror::Error, Debug)]
pub enum CheckpointError {
    /// The file could not be read or written.
    #[error("Checkpoint I/O error for {path}: {source}")]
    Io {
        /// Checkpoint path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The checkpoint could not be encoded.
    #[error("Failed to encode checkpoint: {0}")]
    Encode(#[from] serde_json::Error),

    /// The file is not a well-formed checkpoint.
    #[error("Corrupt checkpoint {path}: {reason}")]
    Corrupt {
        /// Checkpoint path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The stored checksum does not match the content.
    #[error("Checkpoint integrity check failed for {0}: checksum mismatch")]
    ChecksumMismatch(PathBuf),

    /// The file was written by an incompatible version.
    #[error("Unsupported checkpoint version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build reads
        expected: u32,
    },
}

/// Snapshot of a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Format version
    pub version: u32,
    /// When the traversal finished
    pub created_at: DateTime<Utc>,
    /// Minimum file size the traversal used
    pub min_size: u64,
    /// All size groups, singletons included
    pub groups: Vec<SizeGroup>,
    /// Files in groups with 2+ members
    pub candidate_files: u64,
    /// Bytes in groups with 2+ members
    pub candidate_bytes: u64,
}

#[derive(Serialize, Deserialize)]
struct CheckpointEnvelope {
    /// SHA-256 of the compact checkpoint JSON
    checksum: String,
    checkpoint: Checkpoint,
}

impl Checkpoint {
    /// Create a checkpoint from size groups and candidate totals.
    #[must_use]
    pub fn new(
        groups: Vec<SizeGroup>,
        candidate_files: u64,
        candidate_bytes: u64,
        min_size: u64,
    ) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            created_at: Utc::now(),
            min_size,
            groups,
            candidate_files,
            candidate_bytes,
        }
    }

    /// Snapshot a traversal. The skip tally is not persisted.
    #[must_use]
    pub fn from_traversal(traversal: &Traversal, min_size: u64) -> Self {
        Self::new(
            traversal.groups.clone(),
            traversal.candidate_files,
            traversal.candidate_bytes,
            min_size,
        )
    }

    /// Turn the checkpoint back into a traversal result.
    #[must_use]
    pub fn into_traversal(self) -> Traversal {
        Traversal {
            groups: self.groups,
            candidate_files: self.candidate_files,
            candidate_bytes: self.candidate_bytes,
            skipped: SkipTally::default(),
            errors: 0,
        }
    }

    /// Write the checkpoint atomically.
    ///
    /// The data goes to a sibling temporary file which is then renamed over
    /// `path`, so readers never see a half-written checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] if encoding or any file operation fails.
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        let checksum = checksum_of(self)?;
        let envelope = CheckpointEnvelope {
            checksum,
            checkpoint: self.clone(),
        };

        let tmp_path = temp_path(path);
        let io_err = |source| CheckpointError::Io {
            path: tmp_path.clone(),
            source,
        };

        let file = File::create(&tmp_path).map_err(io_err)?;
        let result = if is_gzip(path) {
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
            serde_json::to_writer(&mut encoder, &envelope)?;
            encoder
                .finish()
                .and_then(|mut writer| writer.flush())
                .map_err(io_err)
        } else {
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &envelope)?;
            writer.flush().map_err(io_err)
        };
        if let Err(e) = result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        std::fs::rename(&tmp_path, path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!(
            "Saved checkpoint with {} size groups to {}",
            self.groups.len(),
            path.display()
        );
        Ok(())
    }

    /// Load a checkpoint, verifying its checksum and version.
    ///
    /// Returns `Ok(None)` if `path` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] if the file is unreadable, truncated,
    /// fails its integrity check, or has an unsupported version.
    pub fn load(path: &Path) -> Result<Option<Self>, CheckpointError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CheckpointError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut content = Vec::new();
        let read = if is_gzip(path) {
            GzDecoder::new(BufReader::new(file)).read_to_end(&mut content)
        } else {
            BufReader::new(file).read_to_end(&mut content)
        };
        read.map_err(|e| CheckpointError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let envelope: CheckpointEnvelope =
            serde_json::from_slice(&content).map_err(|e| CheckpointError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if checksum_of(&envelope.checkpoint)? != envelope.checksum {
            return Err(CheckpointError::ChecksumMismatch(path.to_path_buf()));
        }

        let checkpoint = envelope.checkpoint;
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: checkpoint.version,
                expected: CHECKPOINT_VERSION,
            });
        }

        log::info!(
            "Loaded checkpoint from {} ({} size groups, created {})",
            path.display(),
            checkpoint.groups.len(),
            checkpoint.created_at
        );
        Ok(Some(checkpoint))
    }
}

/// SHA-256 of the compact JSON encoding.
fn checksum_of(checkpoint: &Checkpoint) -> Result<String, CheckpointError> {
    let json = serde_json::to_vec(checkpoint)?;
    let mut hasher = Sha256::new();
    hasher.update(&json);
    Ok(format!("{:x}", hasher.finalize()))
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
