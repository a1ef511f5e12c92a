//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! [`Walker`] descends recursively from a root directory and collects a
//! [`FileEntry`] for every regular file it reaches. Children of each directory
//! are sorted by name, so the entry order is stable for an unchanged tree.
//!
//! Unreadable directories and files that cannot be stat'ed are reported as
//! [`ScanError`] values in the [`ScanOutcome`]; they never stop the walk.
//!
//! # Symbolic links
//!
//! Links are never followed. A linked directory is not descended, so link
//! cycles cannot occur, and a link to a file is not reported since removing
//! it would free no space.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{ScanConfig, Walker};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), ScanConfig::default());
//! let outcome = walker.scan().unwrap();
//! println!("{} files, {} errors", outcome.entries.len(), outcome.errors.len());
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{FileEntry, ScanConfig, ScanError};
use crate::progress::ProgressCallback;

/// Everything a walk produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Files that passed the filters, in traversal order
    pub entries: Vec<FileEntry>,
    /// Non-fatal errors hit along the way
    pub errors: Vec<ScanError>,
    /// Whether the walk stopped early due to shutdown
    pub interrupted: bool,
}

impl ScanOutcome {
    /// Sum of the sizes of all reported files.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Recursive file discovery rooted at one directory.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: ScanConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress reporting
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: ScanConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag becomes `true` the walk stops and the outcome is marked
    /// as interrupted.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report discovered files to a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn passes_suffix_filter(&self, path: &Path) -> bool {
        match self.config.suffix() {
            None => true,
            Some(suffix) => path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().ends_with(suffix)),
        }
    }

    /// Check that the root exists and is a directory.
    fn check_root(&self) -> Result<(), ScanError> {
        let metadata =
            std::fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        Ok(())
    }

    /// Walk the tree and collect every matching regular file.
    ///
    /// # Errors
    ///
    /// Fails only when the root itself is missing, unreadable or not a
    /// directory. Everything below the root is reported in
    /// [`ScanOutcome::errors`].
    pub fn scan(&self) -> Result<ScanOutcome, ScanError> {
        self.check_root()?;

        let mut outcome = ScanOutcome::default();

        if let Some(ref progress) = self.progress {
            progress.on_phase_start("scan", 0);
        }

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        for entry_result in walk_dir {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                outcome.interrupted = true;
                break;
            }

            let mut entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    outcome.errors.push(walk_error(path, &e));
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                // jwalk hands back the directory itself when its children can't be read.
                if let Some(e) = entry.read_children_error.take() {
                    let path = e.path().map_or_else(|| entry.path(), std::borrow::ToOwned::to_owned);
                    outcome.errors.push(walk_error(path, &e));
                }
                continue;
            }

            let path = entry.path();
            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", path.display());
                continue;
            }

            if !self.passes_suffix_filter(&path) {
                log::trace!("Skipping file due to suffix filter: {}", path.display());
                continue;
            }

            let metadata = match std::fs::symlink_metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("Cannot stat {}: {}", path.display(), e);
                    outcome.errors.push(ScanError::from_io(&path, e));
                    continue;
                }
            };

            if !metadata.is_file() {
                log::trace!("Skipping non-regular file: {}", path.display());
                continue;
            }

            if let Some(ref progress) = self.progress {
                progress.on_progress(outcome.entries.len() + 1, &path.to_string_lossy());
            }

            outcome.entries.push(FileEntry::new(path, metadata.len()));
        }

        if let Some(ref progress) = self.progress {
            progress.on_phase_end("scan");
        }

        log::info!(
            "Scan complete: {} files ({} bytes) under {}, {} errors",
            outcome.entries.len(),
            outcome.total_size(),
            self.root.display(),
            outcome.errors.len()
        );

        Ok(outcome)
    }
}

/// Convert a jwalk failure for `path` into a [`ScanError`].
fn walk_error(path: PathBuf, error: &jwalk::Error) -> ScanError {
    log::warn!("Walker error for {}: {}", path.display(), error);
    classify_walk_error(path, error.io_error().map(std::io::Error::kind), error.to_string())
}

fn classify_walk_error(path: PathBuf, kind: Option<ErrorKind>, detail: String) -> ScanError {
    match kind {
        Some(ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
        Some(ErrorKind::NotFound) => ScanError::NotFound(path),
        Some(kind) => ScanError::Io {
            path,
            source: std::io::Error::new(kind, detail),
        },
        None => ScanError::Io {
            path,
            source: std::io::Error::other(detail),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    /// Create a test directory with some files.
    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        let mut f = File::create(dir.path().join("file1.txt")).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let mut f = File::create(dir.path().join("file2.log")).unwrap();
        writeln!(f, "Another file").unwrap();

        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        let mut f = File::create(subdir.join("nested.txt")).unwrap();
        writeln!(f, "Nested file content").unwrap();

        dir
    }

    #[test]
    fn test_walker_finds_files() {
        let dir = create_test_dir();
        let outcome = Walker::new(dir.path(), ScanConfig::default())
            .scan()
            .unwrap();

        assert_eq!(outcome.entries.len(), 3);
        assert!(outcome.errors.is_empty());
        assert!(!outcome.interrupted);
        for file in &outcome.entries {
            assert!(file.path.exists());
            assert_eq!(fs::metadata(&file.path).unwrap().len(), file.size);
        }
    }

    #[test]
    fn test_walker_suffix_filter() {
        let dir = create_test_dir();
        let outcome = Walker::new(dir.path(), ScanConfig::with_extension(".txt"))
            .scan()
            .unwrap();

        assert_eq!(outcome.entries.len(), 2);
        for file in &outcome.entries {
            assert!(file.path.to_string_lossy().ends_with(".txt"));
        }
    }

    #[test]
    fn test_walker_empty_suffix_keeps_everything() {
        let dir = create_test_dir();
        let outcome = Walker::new(dir.path(), ScanConfig::with_extension(""))
            .scan()
            .unwrap();
        assert_eq!(outcome.entries.len(), 3);
    }

    #[test]
    fn test_walker_includes_empty_files() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("empty")).unwrap();

        let outcome = Walker::new(dir.path(), ScanConfig::default())
            .scan()
            .unwrap();
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].size, 0);
    }

    #[test]
    fn test_walker_order_is_deterministic() {
        let dir = create_test_dir();
        let first: Vec<_> = Walker::new(dir.path(), ScanConfig::default())
            .scan()
            .unwrap()
            .entries;
        let second: Vec<_> = Walker::new(dir.path(), ScanConfig::default())
            .scan()
            .unwrap()
            .entries;
        assert_eq!(first, second);
    }

    #[test]
    fn test_walker_skip_hidden() {
        let dir = create_test_dir();
        fs::write(dir.path().join(".hidden"), b"secret").unwrap();

        let all = Walker::new(dir.path(), ScanConfig::default())
            .scan()
            .unwrap();
        assert_eq!(all.entries.len(), 4);

        let config = ScanConfig {
            skip_hidden: true,
            ..Default::default()
        };
        let visible = Walker::new(dir.path(), config).scan().unwrap();
        assert_eq!(visible.entries.len(), 3);
    }

    #[test]
    fn test_walker_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = Walker::new(&missing, ScanConfig::default())
            .scan()
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound(_)));
    }

    #[test]
    fn test_walker_root_is_file() {
        let dir = create_test_dir();
        let file = dir.path().join("file1.txt");

        let err = Walker::new(&file, ScanConfig::default()).scan().unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn test_walker_shutdown_flag() {
        let dir = create_test_dir();
        let flag = Arc::new(AtomicBool::new(true));

        let outcome = Walker::new(dir.path(), ScanConfig::default())
            .with_shutdown_flag(flag)
            .scan()
            .unwrap();
        assert!(outcome.interrupted);
        assert!(outcome.entries.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_walker_does_not_follow_symlinks() {
        let dir = create_test_dir();
        std::os::unix::fs::symlink(dir.path().join("file1.txt"), dir.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let outcome = Walker::new(dir.path(), ScanConfig::default())
            .scan()
            .unwrap();
        assert_eq!(outcome.entries.len(), 3);
        assert!(outcome
            .entries
            .iter()
            .all(|e| !e.path.ends_with("link.txt")));
    }

    #[test]
    fn test_classify_walk_error() {
        let path = PathBuf::from("/data/locked");

        let err = classify_walk_error(path.clone(), Some(ErrorKind::PermissionDenied), "denied".into());
        assert!(matches!(err, ScanError::PermissionDenied(ref p) if *p == path));

        let err = classify_walk_error(path.clone(), Some(ErrorKind::NotFound), "gone".into());
        assert!(matches!(err, ScanError::NotFound(_)));

        let err = classify_walk_error(path.clone(), Some(ErrorKind::Interrupted), "eintr".into());
        match err {
            ScanError::Io { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), ErrorKind::Interrupted);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = classify_walk_error(path, None, "loop detected".into());
        assert!(err.to_string().contains("loop detected"));
    }
}
