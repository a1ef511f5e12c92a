//! Content-hash index over a size partition.
//!
//! # Overview
//!
//! [`DuplicateIndex::build`] walks a [`SizePartition`] in its established
//! order, hashes the files of every size bucket that holds two or more paths,
//! and groups them by digest. A file is a duplicate iff it shares both size
//! and digest with another file.
//!
//! Numbering happens in the same pass that derives the groups: sizes in
//! partition order, digests in first-seen order, paths in hashing order. The
//! first record is number 1 and numbers never repeat within an index.
//!
//! Hashing runs on a bounded rayon pool. Results are collected in input
//! order and merged on the calling thread, so the index is identical to the
//! one a sequential run would build.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{partition_by_size, DuplicateIndex, IndexConfig, SortOrder};
//! use dupsweep::scanner::{Hasher, ScanConfig, Walker};
//! use std::path::Path;
//!
//! let outcome = Walker::new(Path::new("."), ScanConfig::default()).scan().unwrap();
//! let (partition, _) = partition_by_size(outcome.entries, SortOrder::Ascending);
//! let index = DuplicateIndex::build(&partition, &Hasher::new(), &IndexConfig::default());
//!
//! for group in &index.report().groups {
//!     for record in &group.records {
//!         println!("{}. {}", record.number, record.path.display());
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Serialize, Serializer};

use super::groups::{SizeBucket, SizePartition};
use crate::progress::ProgressCallback;
use crate::scanner::{hash_to_hex, Digest, HashError, Hasher};

/// Configuration for the hashing stage.
#[derive(Clone)]
pub struct IndexConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl IndexConfig {
    /// Set the I/O thread count (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

fn serialize_digest<S: Serializer>(digest: &Digest, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hash_to_hex(digest))
}

/// Paths sharing one size and one digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashBucket {
    /// Content digest shared by every path
    #[serde(serialize_with = "serialize_digest")]
    pub digest: Digest,
    /// Paths in hashing order
    pub paths: Vec<PathBuf>,
}

impl HashBucket {
    /// Whether this bucket is a duplicate group.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.paths.len() > 1
    }
}

/// Hash buckets for one size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeHashes {
    /// File size in bytes
    pub size: u64,
    /// Buckets in first-seen digest order
    pub buckets: Vec<HashBucket>,
    /// Files never hashed because they were alone in their size
    pub unhashed: Vec<PathBuf>,
}

/// A numbered file within a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    /// Selection number, unique within the index, starting at 1
    pub number: usize,
    /// Path of the file
    pub path: PathBuf,
    /// Size recorded at scan time
    pub size: u64,
}

/// Two or more files sharing size and digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// File size in bytes
    pub size: u64,
    /// Content digest
    #[serde(serialize_with = "serialize_digest")]
    pub digest: Digest,
    /// Numbered members in hashing order
    pub records: Vec<DuplicateRecord>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }

    /// Bytes reclaimable by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.records.len().saturating_sub(1) as u64
    }

    /// Selection numbers of every member.
    #[must_use]
    pub fn numbers(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.number).collect()
    }
}

/// Ordered duplicate groups, ready for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    /// Groups in numbering order
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// Check if no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of duplicate groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of numbered records across all groups.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }

    /// Total bytes reclaimable by keeping one copy per group.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_space).sum()
    }

    /// All records in numbering order.
    pub fn records(&self) -> impl Iterator<Item = &DuplicateRecord> {
        self.groups.iter().flat_map(|g| g.records.iter())
    }
}

/// Statistics from the hashing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Files submitted for hashing
    pub input_files: usize,
    /// Files successfully hashed
    pub hashed_files: usize,
    /// Files that failed to hash
    pub failed_files: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
}

/// Size → digest → paths index with numbered duplicate records.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    sizes: Vec<SizeHashes>,
    report: DuplicateReport,
    /// `locations[n - 1]` is (group, member) of record `n`
    locations: Vec<(usize, usize)>,
    errors: Vec<HashError>,
    stats: IndexStats,
    interrupted: bool,
}

impl DuplicateIndex {
    /// Hash the partition and derive numbered duplicate groups.
    ///
    /// Files that cannot be read are left out of their bucket and kept in
    /// [`DuplicateIndex::errors`]; they never stop the build.
    #[must_use]
    pub fn build(partition: &SizePartition, hasher: &Hasher, config: &IndexConfig) -> Self {
        // Jobs in partition order; singletons can never form a group.
        let jobs: Vec<(usize, &PathBuf)> = partition
            .buckets()
            .iter()
            .enumerate()
            .filter(|(_, bucket)| bucket.has_candidates())
            .flat_map(|(slot, bucket)| bucket.paths.iter().map(move |p| (slot, p)))
            .collect();

        let mut stats = IndexStats {
            input_files: jobs.len(),
            ..Default::default()
        };

        if let Some(ref callback) = config.progress_callback {
            callback.on_phase_start("hash", jobs.len());
        }
        log::info!("Hashing {} candidate files", jobs.len());

        let results = hash_jobs(&jobs, partition.buckets(), hasher, config);

        let interrupted = config.is_shutdown_requested();
        if interrupted {
            log::info!("Hashing interrupted by shutdown signal");
        }

        let mut sizes: Vec<SizeHashes> = partition
            .buckets()
            .iter()
            .map(|bucket| SizeHashes {
                size: bucket.size,
                buckets: Vec::new(),
                unhashed: if bucket.has_candidates() {
                    Vec::new()
                } else {
                    bucket.paths.clone()
                },
            })
            .collect();

        let mut errors = Vec::new();
        let mut slot_by_digest: Vec<HashMap<Digest, usize>> = vec![HashMap::new(); sizes.len()];

        for ((slot, path), result) in jobs.into_iter().zip(results) {
            match result {
                Ok(digest) => {
                    stats.hashed_files += 1;
                    stats.bytes_hashed += sizes[slot].size;
                    let entry = &mut sizes[slot];
                    let bucket_slot = *slot_by_digest[slot].entry(digest).or_insert_with(|| {
                        entry.buckets.push(HashBucket {
                            digest,
                            paths: Vec::new(),
                        });
                        entry.buckets.len() - 1
                    });
                    entry.buckets[bucket_slot].paths.push(path.clone());
                }
                Err(HashError::Interrupted(_)) => {}
                Err(e) => {
                    log::warn!("Failed to hash {}: {}", e.path().display(), e);
                    stats.failed_files += 1;
                    errors.push(e);
                }
            }
        }

        if let Some(ref callback) = config.progress_callback {
            callback.on_phase_end("hash");
        }

        let (report, locations) = number_duplicates(&sizes);

        log::info!(
            "Index complete: {} groups, {} numbered files, {} bytes reclaimable, {} hash errors",
            report.group_count(),
            report.record_count(),
            report.wasted_space(),
            errors.len()
        );

        Self {
            sizes,
            report,
            locations,
            errors,
            stats,
            interrupted,
        }
    }

    /// Per-size hash buckets in partition order.
    #[must_use]
    pub fn sizes(&self) -> &[SizeHashes] {
        &self.sizes
    }

    /// Duplicate groups with their numbered records.
    #[must_use]
    pub fn report(&self) -> &DuplicateReport {
        &self.report
    }

    /// Look up the record carrying `number`.
    #[must_use]
    pub fn record(&self, number: usize) -> Option<&DuplicateRecord> {
        let (group, member) = *self.locations.get(number.checked_sub(1)?)?;
        self.report.groups.get(group)?.records.get(member)
    }

    /// The group containing record `number`.
    #[must_use]
    pub fn group_of(&self, number: usize) -> Option<&DuplicateGroup> {
        let (group, _) = *self.locations.get(number.checked_sub(1)?)?;
        self.report.groups.get(group)
    }

    /// Highest assigned number (0 when there are no duplicates).
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.locations.len()
    }

    /// Files that could not be hashed.
    #[must_use]
    pub fn errors(&self) -> &[HashError] {
        &self.errors
    }

    /// Hashing statistics.
    #[must_use]
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    /// Whether hashing stopped early.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }
}

/// Hash every job, returning results in job order.
fn hash_jobs(
    jobs: &[(usize, &PathBuf)],
    buckets: &[SizeBucket],
    hasher: &Hasher,
    config: &IndexConfig,
) -> Vec<Result<Digest, HashError>> {
    let done = AtomicUsize::new(0);
    let hash_one = |slot: usize, path: &PathBuf| -> Result<Digest, HashError> {
        if config.is_shutdown_requested() {
            return Err(HashError::Interrupted(path.clone()));
        }
        let result = hasher.full_hash(path);
        if let Some(ref callback) = config.progress_callback {
            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            callback.on_progress(current, &path.to_string_lossy());
            if result.is_ok() {
                callback.on_item_completed(buckets[slot].size);
            }
        }
        log::trace!("Hashed {}", path.display());
        result
    };

    match rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(|| jobs.par_iter().map(|&(slot, path)| hash_one(slot, path)).collect()),
        Err(e) => {
            log::warn!("Failed to create hashing thread pool ({}), hashing sequentially", e);
            jobs.iter().map(|&(slot, path)| hash_one(slot, path)).collect()
        }
    }
}

/// Derive groups and numbering in a single ordered pass.
fn number_duplicates(sizes: &[SizeHashes]) -> (DuplicateReport, Vec<(usize, usize)>) {
    let mut report = DuplicateReport::default();
    let mut locations = Vec::new();

    for size in sizes {
        for bucket in size.buckets.iter().filter(|b| b.is_duplicate()) {
            let group_idx = report.groups.len();
            let records = bucket
                .paths
                .iter()
                .enumerate()
                .map(|(member, path)| {
                    locations.push((group_idx, member));
                    DuplicateRecord {
                        number: locations.len(),
                        path: path.clone(),
                        size: size.size,
                    }
                })
                .collect();

            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                hash_to_hex(&bucket.digest),
                bucket.paths.len(),
                size.size
            );

            report.groups.push(DuplicateGroup {
                size: size.size,
                digest: bucket.digest,
                records,
            });
        }
    }

    (report, locations)
}
