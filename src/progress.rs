//! Progress tracking with optional indicatif bars.
//!
//! [`ProgressTracker`] holds two monotonically increasing counters, files
//! processed and bytes processed, updated atomically from any thread. When
//! display is enabled the counters also drive a files bar and a bytes bar;
//! a spinner covers the traversal phase, whose size is not known up front.
//!
//! Totals for the comparison phase are the candidate totals plus every file
//! that is counted without being compared (below minimum size, or alone in
//! its size group), so the counters reach the totals exactly once all groups
//! are done.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Terminal bars fed by the tracker.
struct Bars {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    files: Mutex<Option<ProgressBar>>,
    bytes: Mutex<Option<ProgressBar>>,
}

/// Shared files/bytes counters with optional progress bars.
pub struct ProgressTracker {
    files: AtomicU64,
    bytes: AtomicU64,
    total_files: AtomicU64,
    total_bytes: AtomicU64,
    bars: Option<Bars>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("files", &self.files_processed())
            .field("bytes", &self.bytes_processed())
            .field("total_files", &self.total_files())
            .field("total_bytes", &self.total_bytes())
            .field("visible", &self.bars.is_some())
            .finish()
    }
}

impl ProgressTracker {
    /// Create a tracker; `visible` enables the terminal bars.
    ///
    /// # Examples
    ///
    /// ```
    /// use pardupes::progress::ProgressTracker;
    ///
    /// let progress = ProgressTracker::new(false);
    /// progress.advance(2, 2048);
    /// assert_eq!(progress.files_processed(), 2);
    /// ```
    #[must_use]
    pub fn new(visible: bool) -> Self {
        let bars = visible.then(|| Bars {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            walking: Mutex::new(None),
            files: Mutex::new(None),
            bytes: Mutex::new(None),
        });
        Self {
            files: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            total_files: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            bars,
        }
    }

    /// Create a tracker that never draws.
    #[must_use]
    pub fn hidden() -> Self {
        Self::new(false)
    }

    /// Show the traversal spinner.
    pub fn start_traversal(&self) {
        let Some(bars) = &self.bars else { return };
        let pb = bars.multi.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message("Traversing");
        pb.enable_steady_tick(Duration::from_millis(100));
        *lock(&bars.walking) = Some(pb);
    }

    /// Finish the traversal spinner.
    pub fn finish_traversal(&self) {
        let Some(bars) = &self.bars else { return };
        if let Some(pb) = lock(&bars.walking).take() {
            pb.finish_with_message("Traversal complete");
        }
    }

    /// Set the comparison totals and show the files and bytes bars.
    pub fn start_comparison(&self, total_files: u64, total_bytes: u64) {
        self.total_files.store(total_files, Ordering::SeqCst);
        self.total_bytes.store(total_bytes, Ordering::SeqCst);

        let Some(bars) = &self.bars else { return };
        let files = bars.multi.add(ProgressBar::new(total_files));
        files.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) (ETA: {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-"),
        );
        files.set_position(self.files_processed());

        let bytes = bars.multi.add(ProgressBar::new(total_bytes));
        bytes.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.green/blue}] {binary_bytes}/{binary_total_bytes} {binary_bytes_per_sec}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-"),
        );
        bytes.set_position(self.bytes_processed());

        *lock(&bars.files) = Some(files);
        *lock(&bars.bytes) = Some(bytes);
    }

    /// Record `files` files totalling `bytes` bytes as processed.
    pub fn advance(&self, files: u64, bytes: u64) {
        self.files.fetch_add(files, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);

        let Some(bars) = &self.bars else { return };
        if let Some(pb) = lock(&bars.files).as_ref() {
            pb.inc(files);
        }
        if let Some(pb) = lock(&bars.bytes).as_ref() {
            pb.inc(bytes);
        }
    }

    /// Files processed so far.
    #[must_use]
    pub fn files_processed(&self) -> u64 {
        self.files.load(Ordering::Relaxed)
    }

    /// Bytes processed so far.
    #[must_use]
    pub fn bytes_processed(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Expected total files for the comparison phase.
    #[must_use]
    pub fn total_files(&self) -> u64 {
        self.total_files.load(Ordering::SeqCst)
    }

    /// Expected total bytes for the comparison phase.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::SeqCst)
    }

    /// Finish and clear every bar.
    pub fn finish(&self) {
        let Some(bars) = &self.bars else { return };
        for slot in [&bars.walking, &bars.files, &bars.bytes] {
            if let Some(pb) = lock(slot).take() {
                pb.finish_and_clear();
            }
        }
    }
}

fn lock(slot: &Mutex<Option<ProgressBar>>) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
