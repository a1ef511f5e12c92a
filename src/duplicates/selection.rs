//! Resolution of user-selected record numbers to concrete files.
//!
//! [`resolve_selection`] is a pure validate-and-resolve step: either every
//! requested number exists in the index and the whole batch resolves, or the
//! batch is rejected and nothing is returned. Re-asking the user is the
//! caller's business.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use super::index::DuplicateIndex;

/// Why a selection was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// No numbers were supplied.
    #[error("no file numbers selected")]
    EmptySelection,

    /// Some numbers are not assigned to any duplicate record.
    #[error("unknown file number(s): {}", join_numbers(.0))]
    UnknownSelection(Vec<usize>),

    /// The selection would remove every copy of a duplicate group.
    #[error("selection removes every copy of {} (numbers {}); keep at least one", .path.display(), join_numbers(.numbers))]
    AllCopiesSelected {
        /// First path of the affected group
        path: PathBuf,
        /// Numbers of the group's members
        numbers: Vec<usize>,
    },
}

fn join_numbers(numbers: &[usize]) -> String {
    numbers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A selected file, ready for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    /// Record number the user picked
    pub number: usize,
    /// Path of the file
    pub path: PathBuf,
    /// Size recorded at scan time
    pub size: u64,
}

/// Options for [`resolve_selection`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionPolicy {
    /// Reject selections that cover every member of a group.
    pub keep_one: bool,
}

/// Validate `requested` against the index and resolve it.
///
/// Targets come back in first-occurrence order of `requested`; a number
/// repeated in the request resolves once.
///
/// # Errors
///
/// - [`SelectionError::EmptySelection`] if `requested` is empty
/// - [`SelectionError::UnknownSelection`] listing every unassigned number
/// - [`SelectionError::AllCopiesSelected`] when `policy.keep_one` is set and a
///   whole group is selected
pub fn resolve_selection(
    index: &DuplicateIndex,
    requested: &[usize],
    policy: SelectionPolicy,
) -> Result<Vec<ResolvedTarget>, SelectionError> {
    if requested.is_empty() {
        return Err(SelectionError::EmptySelection);
    }

    let mut seen = HashSet::new();
    let unique: Vec<usize> = requested
        .iter()
        .copied()
        .filter(|n| seen.insert(*n))
        .collect();

    let unknown: Vec<usize> = unique
        .iter()
        .copied()
        .filter(|n| index.record(*n).is_none())
        .collect();
    if !unknown.is_empty() {
        log::debug!("Rejecting selection, unknown numbers: {:?}", unknown);
        return Err(SelectionError::UnknownSelection(unknown));
    }

    if policy.keep_one {
        for &number in &unique {
            if let Some(group) = index.group_of(number) {
                if group.records.iter().all(|r| seen.contains(&r.number)) {
                    log::warn!(
                        "Selection would delete all {} copies of {}",
                        group.len(),
                        group.records[0].path.display()
                    );
                    return Err(SelectionError::AllCopiesSelected {
                        path: group.records[0].path.clone(),
                        numbers: group.numbers(),
                    });
                }
            }
        }
    }

    let targets: Vec<ResolvedTarget> = unique
        .iter()
        .filter_map(|&n| index.record(n))
        .map(|record| ResolvedTarget {
            number: record.number,
            path: record.path.clone(),
            size: record.size,
        })
        .collect();

    log::debug!(
        "Selection resolved: {} files, {} bytes",
        targets.len(),
        targets.iter().map(|t| t.size).sum::<u64>()
    );

    Ok(targets)
}
