//! NUL-delimited original/duplicate pair records.
//!
//! Each pair is written as `original\0duplicate\0`. Paths are written as raw
//! bytes on Unix so names that are not valid UTF-8 survive the round trip
//! through `xargs -0` and similar tools.

use std::io::{self, Write};
use std::path::Path;

use crate::duplicates::DuplicateSet;

/// Writes duplicate sets as NUL-delimited pairs.
#[derive(Debug)]
pub struct PairsOutput<'a> {
    sets: &'a [DuplicateSet],
}

impl<'a> PairsOutput<'a> {
    /// Create a pairs writer over the given sets.
    #[must_use]
    pub fn new(sets: &'a [DuplicateSet]) -> Self {
        Self { sets }
    }

    /// Number of records that will be written.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.sets.iter().map(DuplicateSet::duplicate_count).sum()
    }

    /// Write every pair to `writer` and flush it.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for set in self.sets {
            for (original, duplicate) in set.pairs() {
                write_path(writer, original)?;
                writer.write_all(b"\0")?;
                write_path(writer, duplicate)?;
                writer.write_all(b"\0")?;
            }
        }
        writer.flush()
    }
}

#[cfg(unix)]
fn write_path<W: Write>(writer: &mut W, path: &Path) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;
    writer.write_all(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn write_path<W: Write>(writer: &mut W, path: &Path) -> io::Result<()> {
    writer.write_all(path.to_string_lossy().as_bytes())
}
