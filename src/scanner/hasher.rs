//! BLAKE3 content fingerprints and whole-file hashing.
//!
//! # Overview
//!
//! Files of equal size are compared in two steps:
//!
//! 1. A cheap [`Fingerprint`]: for files up to [`SAMPLING_THRESHOLD`] bytes
//!    the whole content is hashed; larger files are sampled at the head,
//!    middle and tail ([`SAMPLE_SIZE`] bytes each). The file size is mixed in.
//! 2. For sampled files, a streaming BLAKE3 hash of the entire content
//!    confirms the match. BLAKE3 is collision resistant, so equal full hashes
//!    are treated as equal content. [`Hasher::files_identical`] is available
//!    for byte-for-byte verification on top of that.
//!
//! Reads check that the file still has the size recorded during traversal,
//! so a file rewritten between traversal and comparison is dropped instead of
//! being compared under a stale size.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::HashError;

/// Size of each sample read for large-file fingerprints (16 KiB).
pub const SAMPLE_SIZE: u64 = 16 * 1024;

/// Files up to this size are fingerprinted over their whole content (128 KiB).
pub const SAMPLING_THRESHOLD: u64 = 128 * 1024;

/// Read buffer for streaming hashes and comparisons.
const BUFFER_SIZE: usize = 64 * 1024;

/// A 32-byte BLAKE3 digest.
pub type Hash = [u8; 32];

/// A content fingerprint for bucketing same-size files.
pub type Fingerprint = Hash;

/// Stateless BLAKE3 hasher for fingerprints and full-content hashes.
#[derive(Debug, Clone)]
pub struct Hasher {
    sample_size: u64,
    sampling_threshold: u64,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default sampling parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sample_size: SAMPLE_SIZE,
            sampling_threshold: SAMPLING_THRESHOLD,
        }
    }

    /// Create a hasher with custom sampling parameters.
    ///
    /// `sampling_threshold` is raised to at least `3 * sample_size` so the
    /// head, middle and tail samples never overlap.
    #[must_use]
    pub fn with_sampling(sample_size: u64, sampling_threshold: u64) -> Self {
        let sample_size = sample_size.max(1);
        Self {
            sample_size,
            sampling_threshold: sampling_threshold.max(sample_size * 3),
        }
    }

    /// Whether the fingerprint of a file of `size` bytes covers all of it.
    #[must_use]
    pub fn covers_whole_file(&self, size: u64) -> bool {
        size <= self.sampling_threshold
    }

    /// Compute the content fingerprint of a file expected to be `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if its
    /// size differs from `size`.
    pub fn fingerprint(&self, path: &Path, size: u64) -> Result<Fingerprint, HashError> {
        let mut file = open_checked(path, size)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(&size.to_le_bytes());

        if self.covers_whole_file(size) {
            stream_exact(&mut file, path, size, &mut hasher)?;
            return Ok(*hasher.finalize().as_bytes());
        }

        let mut buffer = vec![0u8; self.sample_size as usize];
        let offsets = [0, size / 2, size - self.sample_size];
        for offset in offsets {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| HashError::from_io(path, e))?;
            file.read_exact(&mut buffer)
                .map_err(|e| HashError::from_io(path, e))?;
            hasher.update(&buffer);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Compute the BLAKE3 hash of the entire file content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be read or changed size.
    pub fn full_hash(&self, path: &Path, size: u64) -> Result<Hash, HashError> {
        let mut file = open_checked(path, size)?;
        let mut hasher = blake3::Hasher::new();
        stream_exact(&mut file, path, size, &mut hasher)?;
        Ok(*hasher.finalize().as_bytes())
    }

    /// Compare two files byte for byte.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] naming whichever file failed to read.
    pub fn files_identical(&self, a: &Path, b: &Path) -> Result<bool, HashError> {
        let mut reader_a = BufReader::with_capacity(
            BUFFER_SIZE,
            File::open(a).map_err(|e| HashError::from_io(a, e))?,
        );
        let mut reader_b = BufReader::with_capacity(
            BUFFER_SIZE,
            File::open(b).map_err(|e| HashError::from_io(b, e))?,
        );

        let mut buf_a = vec![0u8; BUFFER_SIZE];
        let mut buf_b = vec![0u8; BUFFER_SIZE];
        loop {
            let n = read_full(&mut reader_a, &mut buf_a).map_err(|e| HashError::from_io(a, e))?;
            let m = read_full(&mut reader_b, &mut buf_b).map_err(|e| HashError::from_io(b, e))?;
            if n != m || buf_a[..n] != buf_b[..m] {
                return Ok(false);
            }
            if n == 0 {
                return Ok(true);
            }
        }
    }
}

/// Open a file and check it still has the expected size.
fn open_checked(path: &Path, size: u64) -> Result<File, HashError> {
    let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
    let actual = file
        .metadata()
        .map_err(|e| HashError::from_io(path, e))?
        .len();
    if actual != size {
        return Err(HashError::SizeChanged {
            path: path.to_path_buf(),
            expected: size,
            actual,
        });
    }
    Ok(file)
}

/// Stream a file into `hasher`, failing if it did not hold exactly `size` bytes.
fn stream_exact(
    file: &mut File,
    path: &Path,
    size: u64,
    hasher: &mut blake3::Hasher,
) -> Result<(), HashError> {
    let read = stream_into(file, path, hasher)?;
    if read != size {
        return Err(HashError::SizeChanged {
            path: path.to_path_buf(),
            expected: size,
            actual: read,
        });
    }
    Ok(())
}

/// Stream the rest of a file into a BLAKE3 hasher, returning bytes read.
fn stream_into(file: &mut File, path: &Path, hasher: &mut blake3::Hasher) -> Result<u64, HashError> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| HashError::from_io(path, e))?;
        if n == 0 {
            return Ok(total);
        }
        hasher.update(&buffer[..n]);
        total += n as u64;
    }
}

/// Fill `buf` as far as possible; returns fewer bytes only at EOF.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Render a digest as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
