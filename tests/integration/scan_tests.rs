use dupsweep::scanner::{ScanConfig, ScanError, Walker};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::tempdir;

fn write(path: PathBuf, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let outcome = Walker::new(dir.path(), ScanConfig::default()).scan().unwrap();

    assert!(outcome.entries.is_empty());
    assert!(outcome.errors.is_empty());
    assert!(!outcome.interrupted);
}

#[test]
fn test_scan_nested_tree_in_name_order() {
    let dir = tempdir().unwrap();
    write(dir.path().join("b.txt"), b"bb");
    write(dir.path().join("a.txt"), b"a");
    write(dir.path().join("sub/deep/z.bin"), b"zzz");
    write(dir.path().join("sub/c.txt"), b"");

    let outcome = Walker::new(dir.path(), ScanConfig::default()).scan().unwrap();
    let paths: Vec<PathBuf> = outcome.entries.iter().map(|e| e.path.clone()).collect();

    assert_eq!(
        paths,
        vec![
            dir.path().join("a.txt"),
            dir.path().join("b.txt"),
            dir.path().join("sub/c.txt"),
            dir.path().join("sub/deep/z.bin"),
        ]
    );
    assert_eq!(outcome.total_size(), 6);
}

#[test]
fn test_scan_is_repeatable() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(dir.path().join(format!("d{}/f{}.dat", i % 3, i)), b"x");
    }

    let first = Walker::new(dir.path(), ScanConfig::default()).scan().unwrap();
    let second = Walker::new(dir.path(), ScanConfig::default()).scan().unwrap();
    assert_eq!(first.entries, second.entries);
}

#[test]
fn test_scan_suffix_filter() {
    let dir = tempdir().unwrap();
    write(dir.path().join("photo.jpg"), b"1");
    write(dir.path().join("photo.jpg.bak"), b"2");
    write(dir.path().join("notes.txt"), b"3");
    write(dir.path().join("nested/other.jpg"), b"4");

    let outcome = Walker::new(dir.path(), ScanConfig::with_extension(".jpg"))
        .scan()
        .unwrap();
    let names: Vec<String> = outcome
        .entries
        .iter()
        .map(|e| e.path.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["other.jpg", "photo.jpg"]);
}

#[test]
fn test_scan_empty_suffix_means_no_filter() {
    let dir = tempdir().unwrap();
    write(dir.path().join("a"), b"1");
    write(dir.path().join("b.txt"), b"2");

    let outcome = Walker::new(dir.path(), ScanConfig::with_extension(""))
        .scan()
        .unwrap();
    assert_eq!(outcome.entries.len(), 2);
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    write(dir.path().join(".hidden"), b"1");
    write(dir.path().join(".git/config"), b"2");
    write(dir.path().join("visible"), b"3");

    let all = Walker::new(dir.path(), ScanConfig::default()).scan().unwrap();
    assert_eq!(all.entries.len(), 3);

    let config = ScanConfig {
        skip_hidden: true,
        ..ScanConfig::default()
    };
    let visible = Walker::new(dir.path(), config).scan().unwrap();
    assert_eq!(visible.entries.len(), 1);
    assert_eq!(visible.entries[0].path, dir.path().join("visible"));
}

#[test]
fn test_scan_missing_root() {
    let dir = tempdir().unwrap();
    let err = Walker::new(&dir.path().join("nope"), ScanConfig::default())
        .scan()
        .unwrap_err();
    assert!(matches!(err, ScanError::NotFound(_)));
}

#[test]
fn test_scan_root_is_a_file() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    write(file.clone(), b"x");

    let err = Walker::new(&file, ScanConfig::default()).scan().unwrap_err();
    assert!(matches!(err, ScanError::NotADirectory(_)));
}

#[cfg(unix)]
#[test]
fn test_scan_unreadable_directory_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path().join("ok.txt"), b"ok");
    let locked = dir.path().join("locked");
    write(locked.join("secret.txt"), b"secret");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to observe then.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!("skipping: permission bits are not enforced for this user");
        return;
    }

    let outcome = Walker::new(dir.path(), ScanConfig::default()).scan().unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(outcome.entries.len(), 1);
    assert!(outcome.entries[0].path.ends_with("ok.txt"));
    assert_eq!(outcome.errors.len(), 1);
    assert!(matches!(
        &outcome.errors[0],
        ScanError::PermissionDenied(path) if path == &locked
    ));
}

#[cfg(unix)]
#[test]
fn test_scan_does_not_follow_directory_links() {
    let dir = tempdir().unwrap();
    write(dir.path().join("real/file.txt"), b"data");
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("loop")).unwrap();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("real/up")).unwrap();

    let outcome = Walker::new(dir.path(), ScanConfig::default()).scan().unwrap();
    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].path, dir.path().join("real/file.txt"));
}
