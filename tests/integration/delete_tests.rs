use dupsweep::actions::{delete_targets, DeleteConfig, DeleteError};
use dupsweep::duplicates::ResolvedTarget;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn target(number: usize, path: &Path, size: u64) -> ResolvedTarget {
    ResolvedTarget {
        number,
        path: path.to_path_buf(),
        size,
    }
}

#[test]
fn test_freed_space_is_sum_of_removed_files() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, "12345").unwrap();
    fs::write(&b, "1234567").unwrap();

    let result = delete_targets(
        &[target(1, &a, 5), target(2, &b, 7)],
        &DeleteConfig::default(),
        None,
    );

    assert_eq!(result.freed_bytes, 12);
    assert_eq!(result.success_count(), 2);
    assert!(result.all_succeeded());
    assert!(!a.exists());
    assert!(!b.exists());
}

#[test]
fn test_failure_does_not_stop_batch() {
    let dir = tempdir().unwrap();
    let gone = dir.path().join("gone");
    let present = dir.path().join("present");
    fs::write(&present, "abc").unwrap();

    let result = delete_targets(
        &[target(1, &gone, 3), target(2, &present, 3)],
        &DeleteConfig::default(),
        None,
    );

    assert_eq!(result.freed_bytes, 3);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.failures[0].path, gone);
    assert!(matches!(result.failures[0].error, DeleteError::NotFound(_)));
    assert!(!present.exists());
}

#[test]
fn test_changed_file_is_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grown");
    fs::write(&path, "now longer than before").unwrap();

    let result = delete_targets(&[target(1, &path, 3)], &DeleteConfig::default(), None);

    assert_eq!(result.freed_bytes, 0);
    assert!(matches!(
        result.failures[0].error,
        DeleteError::SizeMismatch { expected: 3, .. }
    ));
    assert!(path.exists());
}

#[test]
fn test_size_check_can_be_disabled() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grown");
    fs::write(&path, "now longer than before").unwrap();

    let config = DeleteConfig::default().with_verify_size(false);
    let result = delete_targets(&[target(1, &path, 3)], &config, None);

    assert_eq!(result.freed_bytes, 3);
    assert!(!path.exists());
}

#[test]
fn test_directory_is_not_deleted() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    let size = fs::metadata(&sub).unwrap().len();

    let result = delete_targets(&[target(1, &sub, size)], &DeleteConfig::default(), None);

    assert!(matches!(result.failures[0].error, DeleteError::NotAFile(_)));
    assert!(sub.exists());
}

#[test]
fn test_deletion_result_serializes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("x");
    fs::write(&path, "x").unwrap();
    let missing = dir.path().join("missing");

    let result = delete_targets(
        &[target(1, &path, 1), target(2, &missing, 1)],
        &DeleteConfig::default(),
        None,
    );
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["freed_bytes"], 1);
    assert_eq!(value["deleted"][0]["number"], 1);
    assert!(value["failures"][0]["error"]
        .as_str()
        .unwrap()
        .starts_with("file not found"));
}
