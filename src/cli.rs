//! Command-line interface.
//!
//! ```bash
//! # Pairs to stdout, NUL-delimited
//! pardupes /mnt/photos /mnt/backup > pairs.bin
//!
//! # Slow network mount: more parallel reads, reuse the traversal next time
//! pardupes --read-concurrency 32 --traversal-checkpoint walk.json.gz /mnt/nas
//!
//! # Move duplicates to the trash once found
//! pardupes --delete --trash ~/Downloads ~/Documents
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Find duplicate files across large or slow directory trees.
///
/// Files are grouped by size, then compared by content fingerprint and full
/// hash. Among identical files the one under the earliest given PATH (then
/// first in natural sort order) is kept as the original.
#[derive(Debug, Parser)]
#[command(name = "pardupes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories to search, highest priority first
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show progress bars on stderr
    #[arg(long)]
    pub progress: bool,

    /// Where to write results ("-" for stdout)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub output: PathBuf,

    /// Write a JSON report instead of NUL-delimited pairs
    #[arg(long)]
    pub json: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Simultaneous file reads (default: 4)
    ///
    /// Raise this for network filesystems with high latency.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub read_concurrency: Option<u64>,

    /// Parallel directory readers during traversal (default: 1)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub traversal_concurrency: Option<u64>,

    /// Size groups compared at once (default: the read concurrency)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub group_concurrency: Option<u64>,

    /// Traversal checkpoint: loaded if present, otherwise written after traversal
    ///
    /// A ".gz" extension enables gzip compression.
    #[arg(long, value_name = "FILE")]
    pub traversal_checkpoint: Option<PathBuf>,

    /// Fail instead of re-traversing when the checkpoint is unreadable
    #[arg(long, requires = "traversal_checkpoint")]
    pub require_checkpoint: bool,

    /// Confirm hash matches with a byte-by-byte comparison
    #[arg(long)]
    pub paranoid: bool,

    /// Delete every duplicate after the search (originals are kept)
    #[arg(long)]
    pub delete: bool,

    /// Move deleted duplicates to the system trash instead of unlinking them
    #[arg(long, requires = "delete")]
    pub trash: bool,

    /// Configuration file (default: the platform config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Whether results go to stdout.
    #[must_use]
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use pardupes::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
