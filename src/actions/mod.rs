//! File actions module.
//!
//! Provides deletion of confirmed duplicates after a run:
//! - Permanent deletion (default)
//! - Move to system trash via the trash crate (recoverable)
//! - Originals are never deleted; re-running is idempotent
//!
//! ```no_run
//! use pardupes::actions::delete::{delete_file, DeleteConfig};
//! use std::path::PathBuf;
//!
//! let path = PathBuf::from("/path/to/duplicate.txt");
//! let result = delete_file(&path, &DeleteConfig::trash());
//! ```

pub mod delete;

pub use delete::{
    delete_duplicates, delete_file, BatchDeleteResult, DeleteConfig, DeleteError, DeleteResult,
};
