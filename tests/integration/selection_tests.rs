use dupsweep::duplicates::{
    partition_by_size, resolve_selection, DuplicateIndex, IndexConfig, SelectionError,
    SelectionPolicy, SortOrder,
};
use dupsweep::scanner::{Hasher, ScanConfig, Walker};
use std::fs;
use tempfile::{tempdir, TempDir};

/// Two groups: {a, b} (5 bytes) and {d, e} (3 bytes); c is unique.
fn two_groups() -> (TempDir, DuplicateIndex) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "hello").unwrap();
    fs::write(dir.path().join("b"), "hello").unwrap();
    fs::write(dir.path().join("c"), "world").unwrap();
    fs::write(dir.path().join("d"), "abc").unwrap();
    fs::write(dir.path().join("e"), "abc").unwrap();

    let outcome = Walker::new(dir.path(), ScanConfig::default()).scan().unwrap();
    let (partition, _) = partition_by_size(outcome.entries, SortOrder::Descending);
    let index = DuplicateIndex::build(&partition, &Hasher::new(), &IndexConfig::default());
    (dir, index)
}

#[test]
fn test_numbers_resolve_to_paths_and_sizes() {
    let (dir, index) = two_groups();
    let targets = resolve_selection(&index, &[3, 1], SelectionPolicy::default()).unwrap();

    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].number, 3);
    assert_eq!(targets[0].path, dir.path().join("d"));
    assert_eq!(targets[0].size, 3);
    assert_eq!(targets[1].path, dir.path().join("a"));
    assert_eq!(targets[1].size, 5);
}

#[test]
fn test_repeats_resolve_once() {
    let (_dir, index) = two_groups();
    let targets = resolve_selection(&index, &[4, 1, 4, 1], SelectionPolicy::default()).unwrap();
    let numbers: Vec<usize> = targets.iter().map(|t| t.number).collect();
    assert_eq!(numbers, vec![4, 1]);
}

#[test]
fn test_any_unknown_number_rejects_batch() {
    let (_dir, index) = two_groups();

    let err = resolve_selection(&index, &[1, 0, 5, 2], SelectionPolicy::default()).unwrap_err();
    assert_eq!(err, SelectionError::UnknownSelection(vec![0, 5]));
}

#[test]
fn test_empty_selection() {
    let (_dir, index) = two_groups();
    assert_eq!(
        resolve_selection(&index, &[], SelectionPolicy::default()),
        Err(SelectionError::EmptySelection)
    );
}

#[test]
fn test_keep_one_guard() {
    let (dir, index) = two_groups();
    let guard = SelectionPolicy { keep_one: true };

    let err = resolve_selection(&index, &[3, 4], guard).unwrap_err();
    match err {
        SelectionError::AllCopiesSelected { path, numbers } => {
            assert_eq!(path, dir.path().join("d"));
            assert_eq!(numbers, vec![3, 4]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(resolve_selection(&index, &[1, 4], guard).is_ok());
    assert!(resolve_selection(&index, &[1, 2], SelectionPolicy::default()).is_ok());
}
