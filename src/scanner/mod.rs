//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Recursive directory walking using jwalk
//! - Suffix filtering of discovered files
//! - Streaming content hashing with BLAKE3
//!
//! # Architecture
//!
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{ScanConfig, Walker};
//! use std::path::Path;
//!
//! let config = ScanConfig::with_extension(".txt");
//! let outcome = Walker::new(Path::new("."), config).scan().unwrap();
//! for file in &outcome.entries {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! for err in &outcome.errors {
//!     eprintln!("Warning: {}", err);
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub use hasher::{hash_to_hex, Digest, Hasher, HASH_BUFFER_SIZE};
pub use walker::{ScanOutcome, Walker};

/// A regular file discovered by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileEntry {
    /// Path to the file, rooted at the scan root
    pub path: PathBuf,
    /// File size in bytes at scan time
    pub size: u64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Options controlling which files the walker reports.
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Only report files whose name ends with this suffix.
    /// `None` or an empty string disables the filter.
    pub extension: Option<String>,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl ScanConfig {
    /// Configuration that keeps only files ending with `suffix`.
    #[must_use]
    pub fn with_extension(suffix: impl Into<String>) -> Self {
        Self {
            extension: Some(suffix.into()),
            ..Self::default()
        }
    }

    /// The active suffix filter, if any.
    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.extension.as_deref().filter(|s| !s.is_empty())
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::NotADirectory(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing was skipped because shutdown was requested.
    #[error("Interrupted before hashing: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that could not be hashed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Interrupted(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
