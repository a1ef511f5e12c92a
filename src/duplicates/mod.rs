//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size partitioning of scanned files ([`groups`])
//! - Content-hash grouping and record numbering ([`index`])
//! - Resolving selected numbers back to files ([`selection`])

pub mod groups;
pub mod index;
pub mod selection;

pub use groups::{partition_by_size, GroupingStats, SizeBucket, SizePartition, SortOrder};
pub use index::{
    DuplicateGroup, DuplicateIndex, DuplicateRecord, DuplicateReport, HashBucket, IndexConfig,
    IndexStats, SizeHashes,
};
pub use selection::{resolve_selection, ResolvedTarget, SelectionError, SelectionPolicy};
