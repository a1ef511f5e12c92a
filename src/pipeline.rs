//! Stage functions tying the core together.
//!
//! A run moves strictly forward through
//! `Scanned -> Bucketed -> [Indexed ->] [Resolved -> Deleted]`. Each stage is
//! exposed as a free function so the interactive front end can stop between
//! stages and ask questions; [`run`] drives all of them from a
//! [`Configuration`] alone.
//!
//! ```no_run
//! use dupsweep::config::Configuration;
//! use dupsweep::pipeline::{run, PipelineOptions};
//!
//! let config = Configuration::builder()
//!     .root(Some("/home/user/Downloads"))
//!     .check_duplicates(true)
//!     .build()
//!     .unwrap();
//! let report = run(&config, &PipelineOptions::default()).unwrap();
//! println!("{} duplicate groups", report.duplicate_report().map_or(0, |r| r.group_count()));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::actions::{delete_targets, DeleteConfig, DeletionResult};
use crate::config::Configuration;
use crate::duplicates::{
    partition_by_size, resolve_selection, DuplicateIndex, DuplicateReport, GroupingStats,
    IndexConfig, ResolvedTarget, SelectionError, SelectionPolicy, SizePartition, SortOrder,
};
use crate::error::ExitCode;
use crate::progress::ProgressCallback;
use crate::scanner::{FileEntry, Hasher, ScanConfig, ScanError, ScanOutcome, Walker};

/// Knobs that shape how stages run, as opposed to what they run on.
#[derive(Clone, Default)]
pub struct PipelineOptions {
    /// Hashing thread count; 0 means the [`IndexConfig`] default.
    pub io_threads: usize,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// How selected files are removed.
    pub delete: DeleteConfig,
    /// Guards applied when resolving a selection.
    pub selection: SelectionPolicy,
    /// Shared Ctrl+C flag.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Progress reporting for scan, hash and delete.
    pub progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("io_threads", &self.io_threads)
            .field("skip_hidden", &self.skip_hidden)
            .field("delete", &self.delete)
            .field("selection", &self.selection)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl PipelineOptions {
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Fatal pipeline errors. Per-file problems never end up here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The root could not be walked at all.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The requested numbers were rejected as a batch.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Last stage a run reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Files were collected.
    Scanned,
    /// Files were partitioned by size.
    Bucketed,
    /// Candidates were hashed and numbered.
    Indexed,
    /// A selection was validated.
    Resolved,
    /// Selected files were removed.
    Deleted,
}

/// Walk the configured root.
///
/// # Errors
///
/// Returns a [`ScanError`] only when the root itself is missing or not a
/// directory; everything below it is reported in the outcome.
pub fn scan(config: &Configuration, options: &PipelineOptions) -> Result<ScanOutcome, ScanError> {
    let scan_config = ScanConfig {
        extension: config.extension_filter().map(str::to_string),
        skip_hidden: options.skip_hidden,
    };

    let mut walker = Walker::new(config.root(), scan_config);
    if let Some(flag) = &options.shutdown_flag {
        walker = walker.with_shutdown_flag(Arc::clone(flag));
    }
    if let Some(progress) = &options.progress {
        walker = walker.with_progress(Arc::clone(progress));
    }
    walker.scan()
}

/// Partition scanned files by size.
#[must_use]
pub fn bucket(entries: Vec<FileEntry>, order: SortOrder) -> (SizePartition, GroupingStats) {
    partition_by_size(entries, order)
}

/// Hash same-size files and number the duplicate groups.
#[must_use]
pub fn index(partition: &SizePartition, options: &PipelineOptions) -> DuplicateIndex {
    let mut config = IndexConfig::default();
    if options.io_threads > 0 {
        config = config.with_io_threads(options.io_threads);
    }
    if let Some(flag) = &options.shutdown_flag {
        config = config.with_shutdown_flag(Arc::clone(flag));
    }
    if let Some(progress) = &options.progress {
        config = config.with_progress_callback(Arc::clone(progress));
    }
    DuplicateIndex::build(partition, &Hasher::new(), &config)
}

/// Turn record numbers into deletion targets.
///
/// # Errors
///
/// See [`resolve_selection`].
pub fn resolve(
    index: &DuplicateIndex,
    numbers: &[usize],
    options: &PipelineOptions,
) -> Result<Vec<ResolvedTarget>, SelectionError> {
    resolve_selection(index, numbers, options.selection)
}

/// Remove the resolved targets.
#[must_use]
pub fn delete(targets: &[ResolvedTarget], options: &PipelineOptions) -> DeletionResult {
    delete_targets(targets, &options.delete, options.progress.as_deref())
}

/// Everything a run produced, up to the stage it reached.
#[derive(Debug)]
pub struct RunReport {
    /// Last completed stage
    pub stage: Stage,
    /// Files grouped by size
    pub partition: SizePartition,
    /// Size partition statistics
    pub grouping: GroupingStats,
    /// Per-path scan failures
    pub scan_errors: Vec<ScanError>,
    /// Hash index, present once indexed
    pub index: Option<DuplicateIndex>,
    /// Deletion results, present once deleted
    pub deletion: Option<DeletionResult>,
    /// Whether Ctrl+C cut the run short
    pub interrupted: bool,
}

impl RunReport {
    /// Report for a run that has been scanned and bucketed.
    #[must_use]
    pub fn bucketed(outcome: ScanOutcome, order: SortOrder) -> Self {
        let interrupted = outcome.interrupted;
        let (partition, grouping) = bucket(outcome.entries, order);
        Self {
            stage: Stage::Bucketed,
            partition,
            grouping,
            scan_errors: outcome.errors,
            index: None,
            deletion: None,
            interrupted,
        }
    }

    /// Attach a hash index.
    pub fn record_index(&mut self, index: DuplicateIndex) {
        self.interrupted |= index.is_interrupted();
        self.index = Some(index);
        self.stage = Stage::Indexed;
    }

    /// Attach deletion results.
    pub fn record_deletion(&mut self, deletion: DeletionResult) {
        self.deletion = Some(deletion);
        self.stage = Stage::Deleted;
    }

    /// Duplicate groups, if hashing ran.
    #[must_use]
    pub fn duplicate_report(&self) -> Option<&DuplicateReport> {
        self.index.as_ref().map(DuplicateIndex::report)
    }

    /// Number of per-file failures across all stages.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.scan_errors.len()
            + self.index.as_ref().map_or(0, |i| i.errors().len())
            + self.deletion.as_ref().map_or(0, DeletionResult::failure_count)
    }

    /// Exit code describing this run.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.interrupted {
            ExitCode::Interrupted
        } else if self.error_count() > 0 {
            ExitCode::PartialSuccess
        } else if self.duplicate_report().is_some_and(DuplicateReport::is_empty) {
            ExitCode::NoDuplicates
        } else {
            ExitCode::Success
        }
    }
}

/// Run every stage the configuration asks for.
///
/// Hashing happens only with `check_duplicates`; resolution and deletion
/// only with `delete_confirmed`. An interrupted run stops before the next
/// stage.
///
/// # Errors
///
/// - [`PipelineError::Scan`] if the root cannot be walked
/// - [`PipelineError::Selection`] if the selected numbers are rejected; no
///   file is deleted in that case
pub fn run(config: &Configuration, options: &PipelineOptions) -> Result<RunReport, PipelineError> {
    let outcome = scan(config, options)?;
    let mut report = RunReport::bucketed(outcome, config.sort_order());

    if !config.check_duplicates() || report.interrupted {
        return Ok(report);
    }

    report.record_index(index(&report.partition, options));

    if !config.delete_confirmed() || report.interrupted || options.is_shutdown_requested() {
        return Ok(report);
    }

    let targets = match &report.index {
        Some(index) => resolve(index, config.selected_numbers(), options)?,
        None => return Ok(report),
    };
    report.stage = Stage::Resolved;

    let deletion = delete(&targets, options);
    report.record_deletion(deletion);

    Ok(report)
}
