//! JSON output for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "root": "/data",
//!   "sort_order": "descending",
//!   "sizes": [{ "size": 5, "paths": ["/data/a.txt", "/data/b.txt"] }],
//!   "duplicates": {
//!     "groups": [{
//!       "size": 5,
//!       "digest": "ea8f16...",
//!       "records": [{ "number": 1, "path": "/data/a.txt", "size": 5 }]
//!     }]
//!   },
//!   "deletion": { "freed_bytes": 5, "deleted": [...], "failures": [] },
//!   "errors": ["Permission denied: /data/locked"],
//!   "summary": {
//!     "total_files": 3,
//!     "total_size": 15,
//!     "distinct_sizes": 1,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 2,
//!     "reclaimable_space": 5,
//!     "interrupted": false,
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   }
//! }
//! ```
//!
//! `duplicates` and `deletion` are `null` when the stage did not run.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::actions::DeletionResult;
use crate::duplicates::{DuplicateReport, SizeBucket, SortOrder};
use crate::error::ExitCode;
use crate::pipeline::RunReport;

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files scanned
    pub total_files: usize,
    /// Bytes scanned
    pub total_size: u64,
    /// Distinct file sizes
    pub distinct_sizes: usize,
    /// Duplicate groups found
    pub duplicate_groups: usize,
    /// Files in duplicate groups
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group
    pub reclaimable_space: u64,
    /// Whether Ctrl+C cut the run short
    pub interrupted: bool,
    /// Process exit code
    pub exit_code: i32,
    /// Exit code name such as "DS000"
    pub exit_code_name: String,
}

/// Complete JSON document for one run.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// Scanned directory
    pub root: &'a Path,
    /// Direction of `sizes`
    pub sort_order: SortOrder,
    /// Every scanned file, grouped by size
    pub sizes: &'a [SizeBucket],
    /// Numbered duplicate groups
    pub duplicates: Option<&'a DuplicateReport>,
    /// Deletion results
    pub deletion: Option<&'a DeletionResult>,
    /// Per-file scan and hash failures
    pub errors: Vec<String>,
    /// Summary statistics
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Build the document for a finished run.
    #[must_use]
    pub fn new(root: &'a Path, report: &'a RunReport, exit_code: ExitCode) -> Self {
        let duplicates = report.duplicate_report();

        let mut errors: Vec<String> = report.scan_errors.iter().map(ToString::to_string).collect();
        if let Some(index) = &report.index {
            errors.extend(index.errors().iter().map(ToString::to_string));
        }

        Self {
            root,
            sort_order: report.partition.sort_order(),
            sizes: report.partition.buckets(),
            duplicates,
            deletion: report.deletion.as_ref(),
            errors,
            summary: JsonSummary {
                total_files: report.grouping.total_files,
                total_size: report.grouping.total_size,
                distinct_sizes: report.grouping.distinct_sizes,
                duplicate_groups: duplicates.map_or(0, DuplicateReport::group_count),
                duplicate_files: duplicates.map_or(0, DuplicateReport::record_count),
                reclaimable_space: duplicates.map_or(0, DuplicateReport::wasted_space),
                interrupted: report.interrupted,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Write indented JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer).map_err(serde_json::Error::io)
    }
}
