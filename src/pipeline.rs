//! End-to-end duplicate search: traversal, comparison, ranking.
//!
//! # Overview
//!
//! [`Pipeline::run`] drives a complete search:
//!
//! 1. **Size groups** come from a traversal checkpoint when one is
//!    configured and readable, otherwise from a live [`traverse`]; a fresh
//!    traversal is saved to the checkpoint path (best effort).
//! 2. **Comparison**: each size group with two or more files becomes one task
//!    on the outer [`WorkerPool`]. Tasks read files through a shared
//!    [`IoPool`], so group-level and read-level concurrency are bounded
//!    separately. Results are collected by the pool's callbacks on this
//!    thread.
//! 3. **Ranking**: duplicate sets are sorted by the rank of their original.
//!
//! A shutdown request stops traversal and the submission of new groups;
//! groups already running finish and the run reports
//! [`FinderError::Interrupted`] without returning partial results.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::checkpoint::{Checkpoint, CheckpointError};
use crate::duplicates::{DupeFinder, DuplicateComparator, DuplicateSet};
use crate::pool::{IoPool, PoolError, WorkerPool};
use crate::progress::ProgressTracker;
use crate::scanner::{traverse, ScanError, Traversal, TraverseConfig};

/// Default number of simultaneous file reads.
pub const DEFAULT_READ_CONCURRENCY: usize = 4;

/// Errors that stop a run.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// No roots were given and no checkpoint could supply size groups.
    #[error("No input: give at least one path or an existing traversal checkpoint")]
    NoInput,

    /// The run was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Traversal failed.
    #[error(transparent)]
    Scan(ScanError),

    /// A required checkpoint could not be used.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// A worker pool failed.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl From<ScanError> for FinderError {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::NotFound(path) => Self::PathNotFound(path),
            ScanError::NotADirectory(path) => Self::NotADirectory(path),
            ScanError::Interrupted => Self::Interrupted,
            other => Self::Scan(other),
        }
    }
}

/// Settings for a run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Roots in priority order
    pub roots: Vec<PathBuf>,
    /// Smallest file size considered
    pub min_size: u64,
    /// Simultaneous file reads (inner pool size)
    pub read_concurrency: usize,
    /// Parallel directory readers during traversal
    pub traversal_concurrency: usize,
    /// Size groups compared at once (outer pool size); defaults to the read concurrency
    pub group_concurrency: Option<usize>,
    /// Checkpoint to read if present, else write after traversal
    pub checkpoint: Option<PathBuf>,
    /// Fail instead of re-traversing when the checkpoint is unusable
    pub require_checkpoint: bool,
    /// Byte-for-byte confirmation of hash matches
    pub paranoid: bool,
    /// Draw progress bars
    pub show_progress: bool,
    /// Optional shutdown flag for graceful termination
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            min_size: 1,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
            traversal_concurrency: 1,
            group_concurrency: None,
            checkpoint: None,
            require_checkpoint: false,
            paranoid: false,
            show_progress: false,
            shutdown_flag: None,
        }
    }
}

impl PipelineConfig {
    /// Create a config for the given roots.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    /// Set the minimum file size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the number of simultaneous file reads (minimum 1).
    #[must_use]
    pub fn with_read_concurrency(mut self, threads: usize) -> Self {
        self.read_concurrency = threads.max(1);
        self
    }

    /// Set the traversal parallelism (minimum 1).
    #[must_use]
    pub fn with_traversal_concurrency(mut self, threads: usize) -> Self {
        self.traversal_concurrency = threads.max(1);
        self
    }

    /// Set the number of size groups compared at once.
    #[must_use]
    pub fn with_group_concurrency(mut self, threads: Option<usize>) -> Self {
        self.group_concurrency = threads.map(|t| t.max(1));
        self
    }

    /// Set the traversal checkpoint path.
    #[must_use]
    pub fn with_checkpoint(mut self, path: Option<PathBuf>, required: bool) -> Self {
        self.checkpoint = path;
        self.require_checkpoint = required;
        self
    }

    /// Enable byte-for-byte confirmation.
    #[must_use]
    pub fn with_paranoid(mut self, paranoid: bool) -> Self {
        self.paranoid = paranoid;
        self
    }

    /// Enable progress bars.
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Effective outer pool size.
    #[must_use]
    pub fn effective_group_concurrency(&self) -> usize {
        self.group_concurrency.unwrap_or(self.read_concurrency).max(1)
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Files recorded in size groups
    pub files_discovered: u64,
    /// Files in groups with 2+ members
    pub candidate_files: u64,
    /// Bytes in groups with 2+ members
    pub candidate_bytes: u64,
    /// Files below the minimum size
    pub skipped_files: u64,
    /// Bytes of files below the minimum size
    pub skipped_bytes: u64,
    /// Entries traversal could not read
    pub traversal_errors: usize,
    /// Files dropped during comparison because they could not be read
    pub read_errors: usize,
    /// Confirmed duplicate sets
    pub duplicate_sets: usize,
    /// Duplicates, originals excluded
    pub duplicate_files: usize,
    /// Bytes held by duplicates
    pub duplicate_bytes: u64,
    /// Whether size groups came from a checkpoint
    pub from_checkpoint: bool,
    /// Time spent producing size groups
    pub traversal_duration: Duration,
    /// Time spent comparing
    pub comparison_duration: Duration,
    /// Wall time of the whole run
    pub total_duration: Duration,
}

impl ScanSummary {
    /// Format duplicate bytes as a human-readable string.
    #[must_use]
    pub fn duplicate_bytes_display(&self) -> String {
        bytesize::ByteSize(self.duplicate_bytes).to_string()
    }

    fn record_sets(&mut self, sets: &[DuplicateSet]) {
        self.duplicate_sets = sets.len();
        self.duplicate_files = sets.iter().map(DuplicateSet::duplicate_count).sum();
        self.duplicate_bytes = sets.iter().map(DuplicateSet::wasted_space).sum();
    }
}

/// Runs a duplicate search.
///
/// # Example
///
/// ```no_run
/// use pardupes::pipeline::{Pipeline, PipelineConfig};
/// use std::path::PathBuf;
///
/// let config = PipelineConfig::new(vec![PathBuf::from("/mnt/photos")]).with_read_concurrency(16);
/// let (sets, summary) = Pipeline::new(config).run().unwrap();
/// println!("{} duplicates ({})", summary.duplicate_files, summary.duplicate_bytes_display());
/// # let _ = sets;
/// ```
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    progress: Option<Arc<ProgressTracker>>,
}

impl Pipeline {
    /// Create a pipeline.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Feed an existing tracker instead of creating one from `show_progress`.
    #[must_use]
    pub fn with_progress_tracker(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the search.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] for bad roots, missing input, an unusable
    /// required checkpoint, a pool failure, or an interruption.
    pub fn run(&self) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError> {
        let start = Instant::now();
        if self.config.roots.is_empty() && self.config.checkpoint.is_none() {
            return Err(FinderError::NoInput);
        }
        let progress = self
            .progress
            .clone()
            .unwrap_or_else(|| Arc::new(ProgressTracker::new(self.config.show_progress)));

        let (traversal, from_checkpoint) = self.size_groups(&progress)?;
        let traversal_duration = start.elapsed();

        let mut summary = ScanSummary {
            files_discovered: traversal.total_files() as u64,
            candidate_files: traversal.candidate_files,
            candidate_bytes: traversal.candidate_bytes,
            skipped_files: traversal.skipped.files,
            skipped_bytes: traversal.skipped.bytes,
            traversal_errors: traversal.errors,
            from_checkpoint,
            traversal_duration,
            ..ScanSummary::default()
        };

        let comparison_start = Instant::now();
        let comparator = Arc::new(DuplicateComparator::new(&self.config.roots));
        let (sets, read_errors) = self.compare(traversal, &comparator, &progress)?;
        summary.read_errors = read_errors;
        summary.comparison_duration = comparison_start.elapsed();
        summary.record_sets(&sets);
        summary.total_duration = start.elapsed();

        log::info!(
            "Found {} duplicates in {} sets ({})",
            summary.duplicate_files,
            summary.duplicate_sets,
            summary.duplicate_bytes_display()
        );
        Ok((sets, summary))
    }

    /// Produce size groups from the checkpoint or a live traversal.
    fn size_groups(&self, progress: &ProgressTracker) -> Result<(Traversal, bool), FinderError> {
        if let Some(path) = &self.config.checkpoint {
            match Checkpoint::load(path) {
                Ok(Some(checkpoint)) => {
                    if checkpoint.min_size != self.config.min_size {
                        log::warn!(
                            "Checkpoint was written with minimum size {} (now {}); files below {} were not recorded",
                            checkpoint.min_size,
                            self.config.min_size,
                            checkpoint.min_size
                        );
                    }
                    let traversal = checkpoint
                        .into_traversal()
                        .filter_min_size(self.config.min_size);
                    return Ok((traversal, true));
                }
                Ok(None) => log::debug!("No checkpoint at {} yet", path.display()),
                Err(e) if self.config.require_checkpoint => return Err(e.into()),
                Err(e) => log::warn!("Ignoring unusable checkpoint: {}", e),
            }
        }
        if self.config.roots.is_empty() {
            return Err(FinderError::NoInput);
        }

        let mut walk_config = TraverseConfig::default()
            .with_concurrency(self.config.traversal_concurrency)
            .with_min_size(self.config.min_size);
        if let Some(flag) = &self.config.shutdown_flag {
            walk_config = walk_config.with_shutdown_flag(Arc::clone(flag));
        }

        progress.start_traversal();
        let traversal = traverse(&self.config.roots, &walk_config);
        progress.finish_traversal();
        let traversal = traversal?;

        if let Some(path) = &self.config.checkpoint {
            let checkpoint = Checkpoint::from_traversal(&traversal, self.config.min_size);
            if let Err(e) = checkpoint.save(path) {
                log::warn!("Failed to save checkpoint: {}", e);
            }
        }
        Ok((traversal, false))
    }

    /// Compare every size group; returns ranked sets and the read error count.
    fn compare(
        &self,
        traversal: Traversal,
        comparator: &Arc<DuplicateComparator>,
        progress: &Arc<ProgressTracker>,
    ) -> Result<(Vec<DuplicateSet>, usize), FinderError> {
        let total_files = traversal.total_files() as u64 + traversal.skipped.files;
        let total_bytes = traversal
            .groups
            .iter()
            .map(|g| g.total_size())
            .sum::<u64>()
            + traversal.skipped.bytes;
        progress.start_comparison(total_files, total_bytes);
        progress.advance(traversal.skipped.files, traversal.skipped.bytes);

        let io = Arc::new(IoPool::new(self.config.read_concurrency)?);
        let finder = Arc::new(
            DupeFinder::new(io, Arc::clone(comparator), Arc::clone(progress))
                .with_paranoid(self.config.paranoid),
        );

        let group_threads = self.config.effective_group_concurrency();
        log::debug!(
            "Comparing {} candidate files with {} group workers and {} readers",
            traversal.candidate_files,
            group_threads,
            self.config.read_concurrency
        );
        let mut pool = WorkerPool::new("pardupes-group", group_threads, Vec::new())?;

        let mut interrupted = false;
        for group in traversal.groups {
            if self.shutdown_requested() {
                interrupted = true;
                break;
            }
            if !group.is_candidate() {
                progress.advance(group.len() as u64, group.total_size());
                continue;
            }
            let finder = Arc::clone(&finder);
            pool.submit(
                move || finder.find(group.size, group.files),
                |sets: &mut Vec<DuplicateSet>, found| sets.extend(found),
            )?;
        }
        let waited = pool.wait_until_complete();
        progress.finish();
        waited?;

        if interrupted || self.shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut sets = pool.into_state();
        sets.sort_by_cached_key(|set| {
            (
                comparator.rank(&set.original.path),
                set.original.path.clone(),
            )
        });
        Ok((sets, finder.read_errors()))
    }

    fn shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}
