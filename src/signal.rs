//! Ctrl+C handling.
//!
//! A single `AtomicBool` is shared by the traversal and the comparison
//! scheduler. Once set, traversal stops at the next directory entry, no new
//! size groups are submitted, and the run ends with exit code 130 after the
//! groups already in flight complete.
//!
//! ```rust,no_run
//! use pardupes::signal::install_handler;
//!
//! let handler = install_handler();
//! let flag = handler.get_flag();
//! // Pass `flag` to PipelineConfig::with_shutdown_flag
//! # let _ = flag;
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to traversal and comparison.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the handler can be reused for another run.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the Ctrl+C hook, or reuse the one installed earlier in this process.
///
/// `ctrlc` allows one hook per process, so repeated calls (several runs in
/// one test binary) get the same handler back with its flag cleared. If the
/// hook cannot be installed the returned handler still works for
/// [`ShutdownHandler::request_shutdown`].
pub fn install_handler() -> ShutdownHandler {
    let handler = GLOBAL_HANDLER.get_or_init(|| {
        let handler = ShutdownHandler::new();
        let flag = handler.get_flag();
        let installed = ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
            let _ = writeln!(std::io::stderr(), "\nInterrupted. Finishing groups in flight...");
            let _ = std::io::stderr().flush();
            log::info!("Shutdown signal received");
        });
        if let Err(e) = installed {
            log::debug!("Ctrl+C handler not installed: {}", e);
        }
        handler
    });
    handler.reset();
    handler.clone()
}
