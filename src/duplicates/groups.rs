//! Size partitioning of scanned files.
//!
//! # Overview
//!
//! Size partitioning is the first step of duplicate detection. Every scanned
//! file lands in exactly one [`SizeBucket`] keyed by its byte length, and the
//! buckets are ordered by size in the requested [`SortOrder`]. Within a
//! bucket, paths keep the order the scanner produced them in.
//!
//! Unlike a plain map, [`SizePartition`] stores its buckets in an explicit
//! `Vec`, so iteration order is part of the data rather than a property of
//! the container.
//!
//! # Example
//!
//! ```
//! use dupsweep::duplicates::{partition_by_size, SortOrder};
//! use dupsweep::scanner::FileEntry;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/a.txt"), 5),
//!     FileEntry::new(PathBuf::from("/b.txt"), 9),
//!     FileEntry::new(PathBuf::from("/c.txt"), 5),
//! ];
//!
//! let (partition, stats) = partition_by_size(files, SortOrder::Descending);
//!
//! assert_eq!(partition.sizes(), vec![9, 5]);
//! assert_eq!(partition.get(5).unwrap().len(), 2);
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.candidate_files, 2);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scanner::FileEntry;

/// Direction in which size buckets are ordered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Largest size first
    #[default]
    #[value(alias = "desc")]
    #[serde(alias = "desc")]
    Descending,
    /// Smallest size first
    #[value(alias = "asc")]
    #[serde(alias = "asc")]
    Ascending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descending => write!(f, "Descending"),
            Self::Ascending => write!(f, "Ascending"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "descending" | "desc" => Ok(Self::Descending),
            "ascending" | "asc" => Ok(Self::Ascending),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// All scanned files sharing one exact size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeBucket {
    /// File size in bytes (shared by all paths in this bucket)
    pub size: u64,
    /// Paths in scan order
    pub paths: Vec<PathBuf>,
}

impl SizeBucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            paths: Vec::new(),
        }
    }

    /// Number of files in this bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether the bucket could contain duplicates (2+ files).
    #[must_use]
    pub fn has_candidates(&self) -> bool {
        self.paths.len() > 1
    }

    /// Total size of all files in this bucket.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.paths.len() as u64
    }
}

/// Scanned files grouped by size, in a fixed bucket order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizePartition {
    order: SortOrder,
    buckets: Vec<SizeBucket>,
}

impl SizePartition {
    /// Direction the buckets are sorted in.
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        self.order
    }

    /// Buckets in partition order.
    #[must_use]
    pub fn buckets(&self) -> &[SizeBucket] {
        &self.buckets
    }

    /// Distinct sizes in partition order.
    #[must_use]
    pub fn sizes(&self) -> Vec<u64> {
        self.buckets.iter().map(|b| b.size).collect()
    }

    /// Bucket for an exact size.
    #[must_use]
    pub fn get(&self, size: u64) -> Option<&SizeBucket> {
        self.buckets.iter().find(|b| b.size == size)
    }

    /// Number of distinct sizes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if no files were partitioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of files across all buckets.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.buckets.iter().map(SizeBucket::len).sum()
    }
}

/// Statistics from size partitioning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes
    pub distinct_sizes: usize,
    /// Files sharing their size with at least one other file
    pub candidate_files: usize,
    /// Files alone in their size bucket
    pub unique_files: usize,
}

impl GroupingStats {
    /// Percentage of files ruled out by size alone.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.unique_files as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Partition files by exact size.
///
/// Every entry lands in the bucket for its size and no entry is dropped or
/// repeated. Buckets are ordered by size in `order`; paths within a bucket
/// keep input order.
#[must_use]
pub fn partition_by_size(
    files: impl IntoIterator<Item = FileEntry>,
    order: SortOrder,
) -> (SizePartition, GroupingStats) {
    let mut buckets: Vec<SizeBucket> = Vec::new();
    let mut slot_by_size: HashMap<u64, usize> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;

        let slot = *slot_by_size.entry(file.size).or_insert_with(|| {
            buckets.push(SizeBucket::new(file.size));
            buckets.len() - 1
        });
        buckets[slot].paths.push(file.path);
    }

    match order {
        SortOrder::Ascending => buckets.sort_by_key(|b| b.size),
        SortOrder::Descending => buckets.sort_by(|a, b| b.size.cmp(&a.size)),
    }

    stats.distinct_sizes = buckets.len();
    for bucket in &buckets {
        if bucket.has_candidates() {
            stats.candidate_files += bucket.len();
            log::debug!(
                "Size bucket {} bytes: {} candidates",
                bucket.size,
                bucket.len()
            );
        } else {
            stats.unique_files += bucket.len();
        }
    }

    log::info!(
        "Partitioned {} files into {} sizes ({} candidates, {:.1}% unique by size)",
        stats.total_files,
        stats.distinct_sizes,
        stats.candidate_files,
        stats.elimination_rate()
    );

    (SizePartition { order, buckets }, stats)
}
