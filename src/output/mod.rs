//! Output writers for duplicate search results.
//!
//! - NUL-delimited original/duplicate pairs for piping into other tools
//! - JSON report for automation
//! - A human-readable summary for the log
//!
//! # Example
//!
//! ```no_run
//! use pardupes::output::PairsOutput;
//! use pardupes::pipeline::{Pipeline, PipelineConfig};
//! use std::path::PathBuf;
//!
//! let pipeline = Pipeline::new(PipelineConfig::new(vec![PathBuf::from(".")]));
//! let (sets, _) = pipeline.run().unwrap();
//! PairsOutput::new(&sets).write_to(&mut std::io::stdout().lock()).unwrap();
//! ```

pub mod json;
pub mod pairs;

pub use json::{JsonOutput, JsonOutputError};
pub use pairs::PairsOutput;

use std::time::Duration;

use bytesize::ByteSize;

use crate::pipeline::ScanSummary;

/// Render the run summary as log lines.
#[must_use]
pub fn summary_lines(summary: &ScanSummary) -> Vec<String> {
    let source = if summary.from_checkpoint {
        "checkpoint"
    } else {
        "traversal"
    };
    let mut lines = vec![
        format!(
            "{} files in size groups ({} candidates, {}), {} below minimum size",
            summary.files_discovered,
            summary.candidate_files,
            ByteSize(summary.candidate_bytes),
            summary.skipped_files
        ),
        format!(
            "{} duplicates in {} sets, {} of duplicate content",
            summary.duplicate_files,
            summary.duplicate_sets,
            summary.duplicate_bytes_display()
        ),
        format!(
            "Times: {} {}, comparison {}, total {}",
            source,
            format_duration(summary.traversal_duration),
            format_duration(summary.comparison_duration),
            format_duration(summary.total_duration)
        ),
    ];
    if summary.traversal_errors > 0 || summary.read_errors > 0 {
        lines.push(format!(
            "Skipped {} unreadable entries during traversal and {} files during comparison",
            summary.traversal_errors, summary.read_errors
        ));
    }
    lines
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs >= 60.0 {
        format!("{}m{:.1}s", (secs / 60.0).floor(), secs % 60.0)
    } else {
        format!("{:.2}s", secs)
    }
}
