//! JSON report for duplicate search results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "size": 1024,
//!       "original": "/mnt/a/file1.txt",
//!       "duplicates": ["/mnt/a/file2.txt", "/mnt/b/file1.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "files_discovered": 100,
//!     "candidate_files": 40,
//!     "duplicate_sets": 5,
//!     "duplicate_files": 10,
//!     "duplicate_bytes": 51200,
//!     "total_duration_ms": 1234,
//!     "exit_code": 0,
//!     "exit_code_name": "PD000"
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pardupes::error::ExitCode;
//! use pardupes::output::json::JsonOutput;
//! use pardupes::pipeline::{Pipeline, PipelineConfig};
//! use std::path::PathBuf;
//!
//! let pipeline = Pipeline::new(PipelineConfig::new(vec![PathBuf::from(".")]));
//! let (sets, summary) = pipeline.run().unwrap();
//!
//! let output = JsonOutput::new(&sets, &summary, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::DuplicateSet;
use crate::error::ExitCode;
use crate::pipeline::ScanSummary;

/// A single duplicate set in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateSet {
    /// File size in bytes
    pub size: u64,
    /// Path of the file to keep
    pub original: String,
    /// Paths with the same content as `original`
    pub duplicates: Vec<String>,
}

impl JsonDuplicateSet {
    /// Create a JSON set from a DuplicateSet.
    #[must_use]
    pub fn from_duplicate_set(set: &DuplicateSet) -> Self {
        Self {
            size: set.size,
            original: set.original.path.to_string_lossy().into_owned(),
            duplicates: set
                .duplicates
                .iter()
                .map(|d| d.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files recorded in size groups
    pub files_discovered: u64,
    /// Files in size groups with two or more members
    pub candidate_files: u64,
    /// Bytes in size groups with two or more members
    pub candidate_bytes: u64,
    /// Files below the minimum size
    pub skipped_files: u64,
    /// Entries traversal could not read
    pub traversal_errors: usize,
    /// Files dropped during comparison because they could not be read
    pub read_errors: usize,
    /// Number of duplicate sets
    pub duplicate_sets: usize,
    /// Number of duplicates (excluding originals)
    pub duplicate_files: usize,
    /// Bytes held by duplicates
    pub duplicate_bytes: u64,
    /// Whether size groups were loaded from a checkpoint
    pub from_checkpoint: bool,
    /// Duration of the traversal phase in milliseconds
    pub traversal_duration_ms: u64,
    /// Duration of the comparison phase in milliseconds
    pub comparison_duration_ms: u64,
    /// Duration of the whole run in milliseconds
    pub total_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "PD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            files_discovered: summary.files_discovered,
            candidate_files: summary.candidate_files,
            candidate_bytes: summary.candidate_bytes,
            skipped_files: summary.skipped_files,
            traversal_errors: summary.traversal_errors,
            read_errors: summary.read_errors,
            duplicate_sets: summary.duplicate_sets,
            duplicate_files: summary.duplicate_files,
            duplicate_bytes: summary.duplicate_bytes,
            from_checkpoint: summary.from_checkpoint,
            traversal_duration_ms: summary.traversal_duration.as_millis() as u64,
            comparison_duration_ms: summary.comparison_duration.as_millis() as u64,
            total_duration_ms: summary.total_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate sets in ranked order
    pub duplicates: Vec<JsonDuplicateSet>,
    /// Run summary
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate sets, summary and exit code.
    ///
    /// # Arguments
    ///
    /// * `sets` - The duplicate sets found by the run
    /// * `summary` - The run summary
    /// * `exit_code` - The exit code for this run
    #[must_use]
    pub fn new(sets: &[DuplicateSet], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: sets.iter().map(JsonDuplicateSet::from_duplicate_set).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
