//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size groups and confirmed duplicate sets
//! - Fingerprint bucketing and full-content confirmation per size group
//! - Choosing the original of each set by root priority and natural order

pub mod comparator;
pub mod finder;
pub mod groups;

pub use comparator::{natural_cmp, natural_path_cmp, sort_naturally, DuplicateComparator, Rank};
pub use finder::DupeFinder;
pub use groups::{group_by_size, DuplicateSet, GroupingStats, SizeGroup};
