//! Best-effort batch deletion of selected duplicates.
//!
//! # Overview
//!
//! [`delete_targets`] removes each resolved file in turn and adds the size
//! recorded at scan time to the freed total for every file actually removed.
//! A failure on one path is recorded and the batch moves on; nothing is
//! rolled back.
//!
//! Before removal each path is stat'ed again. A file that vanished is
//! reported as [`DeleteError::NotFound`]; a file whose size no longer
//! matches the scan is skipped with [`DeleteError::SizeMismatch`].
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::delete::{delete_targets, DeleteConfig};
//! use dupsweep::duplicates::ResolvedTarget;
//! use std::path::PathBuf;
//!
//! let targets = vec![ResolvedTarget {
//!     number: 1,
//!     path: PathBuf::from("/tmp/copy.txt"),
//!     size: 5,
//! }];
//! let result = delete_targets(&targets, &DeleteConfig::default(), None);
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::duplicates::ResolvedTarget;
use crate::progress::ProgressCallback;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size changed since the scan.
    #[error("file changed since scan: {path} (expected {expected} bytes, found {actual})")]
    SizeMismatch {
        /// Path of the changed file
        path: PathBuf,
        /// Size recorded at scan time
        expected: u64,
        /// Size found just before deletion
        actual: u64,
    },

    /// Path no longer refers to a regular file.
    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// Path that could not be trashed
        path: PathBuf,
        /// Message from the trash backend
        message: String,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::NotAFile(p) => p,
            Self::SizeMismatch { path, .. }
            | Self::TrashFailed { path, .. }
            | Self::Io { path, .. } => path,
        }
    }
}

impl Serialize for DeleteError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// How files are removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeleteMode {
    /// Remove the file outright.
    #[default]
    Permanent,
    /// Move the file to the system trash.
    Trash,
}

/// Configuration for deletion operations.
#[derive(Debug, Clone)]
pub struct DeleteConfig {
    /// Removal method.
    pub mode: DeleteMode,
    /// Re-stat each file and skip it if its size changed since the scan.
    pub verify_size: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            mode: DeleteMode::Permanent,
            verify_size: true,
        }
    }
}

impl DeleteConfig {
    /// Config that moves files to the trash.
    #[must_use]
    pub fn trash() -> Self {
        Self {
            mode: DeleteMode::Trash,
            ..Self::default()
        }
    }

    /// Enable/disable the pre-deletion size check.
    #[must_use]
    pub fn with_verify_size(mut self, verify: bool) -> Self {
        self.verify_size = verify;
        self
    }
}

/// One path that could not be deleted.
#[derive(Debug, Serialize)]
pub struct DeleteFailure {
    /// Path that was not removed
    pub path: PathBuf,
    /// Why it was not removed
    pub error: DeleteError,
}

/// Results of a batch deletion.
#[derive(Debug, Default, Serialize)]
pub struct DeletionResult {
    /// Sum of scan-time sizes of removed files.
    pub freed_bytes: u64,
    /// Files actually removed.
    pub deleted: Vec<ResolvedTarget>,
    /// Files that could not be removed.
    pub failures: Vec<DeleteFailure>,
}

impl DeletionResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.deleted.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} file(s), freed {} bytes",
                self.success_count(),
                self.freed_bytes
            )
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {} bytes",
                self.success_count(),
                self.failure_count(),
                self.freed_bytes
            )
        }
    }
}

/// Check that `target` still looks like the file that was scanned.
fn verify_target(target: &ResolvedTarget) -> Result<(), DeleteError> {
    let metadata =
        fs::symlink_metadata(&target.path).map_err(|e| DeleteError::from_io(&target.path, e))?;

    if !metadata.is_file() {
        return Err(DeleteError::NotAFile(target.path.clone()));
    }

    if metadata.len() != target.size {
        log::warn!(
            "File changed since scan: {} (size changed from {} to {})",
            target.path.display(),
            target.size,
            metadata.len()
        );
        return Err(DeleteError::SizeMismatch {
            path: target.path.clone(),
            expected: target.size,
            actual: metadata.len(),
        });
    }

    Ok(())
}

/// Delete one file according to `config`.
///
/// # Errors
///
/// Returns the [`DeleteError`] describing why the file was not removed.
pub fn delete_target(target: &ResolvedTarget, config: &DeleteConfig) -> Result<(), DeleteError> {
    if config.verify_size {
        verify_target(target)?;
    }

    match config.mode {
        DeleteMode::Permanent => {
            fs::remove_file(&target.path).map_err(|e| DeleteError::from_io(&target.path, e))?;
            log::info!(
                "Permanently deleted: {} ({} bytes)",
                target.path.display(),
                target.size
            );
        }
        DeleteMode::Trash => {
            trash::delete(&target.path).map_err(|e| DeleteError::TrashFailed {
                path: target.path.clone(),
                message: e.to_string(),
            })?;
            log::info!(
                "Moved to trash: {} ({} bytes)",
                target.path.display(),
                target.size
            );
        }
    }

    Ok(())
}

/// Delete every target, continuing past failures.
#[must_use]
pub fn delete_targets(
    targets: &[ResolvedTarget],
    config: &DeleteConfig,
    progress: Option<&dyn ProgressCallback>,
) -> DeletionResult {
    let mut result = DeletionResult::default();

    if let Some(cb) = progress {
        cb.on_phase_start("delete", targets.len());
    }

    for (index, target) in targets.iter().enumerate() {
        if let Some(cb) = progress {
            cb.on_progress(index + 1, &target.path.to_string_lossy());
        }

        match delete_target(target, config) {
            Ok(()) => {
                result.freed_bytes += target.size;
                result.deleted.push(target.clone());
            }
            Err(error) => {
                log::warn!("Failed to delete {}: {}", target.path.display(), error);
                result.failures.push(DeleteFailure {
                    path: target.path.clone(),
                    error,
                });
            }
        }
    }

    if let Some(cb) = progress {
        cb.on_phase_end("delete");
    }

    log::info!("{}", result.summary());

    result
}
