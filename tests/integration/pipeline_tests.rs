use dupsweep::config::Configuration;
use dupsweep::duplicates::SortOrder;
use dupsweep::error::ExitCode;
use dupsweep::pipeline::{self, run, PipelineError, PipelineOptions, RunReport, Stage};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn write(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

fn hello_world() -> TempDir {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.txt"), b"hello");
    write(&dir.path().join("b.txt"), b"hello");
    write(&dir.path().join("c.txt"), b"world");
    dir
}

#[test]
fn test_hello_world_end_to_end() {
    let dir = hello_world();
    let config = Configuration::builder()
        .root(Some(dir.path()))
        .sort_order(SortOrder::Descending)
        .check_duplicates(true)
        .delete_confirmed(true)
        .selected_numbers([1])
        .build()
        .unwrap();

    let report = run(&config, &PipelineOptions::default()).unwrap();

    assert_eq!(report.partition.sizes(), vec![5]);
    assert_eq!(report.partition.buckets()[0].paths.len(), 3);

    let duplicates = report.duplicate_report().unwrap();
    assert_eq!(duplicates.group_count(), 1);
    let records = &duplicates.groups[0].records;
    assert_eq!(records.len(), 2);
    assert_eq!((records[0].number, &records[0].path), (1, &dir.path().join("a.txt")));
    assert_eq!((records[1].number, &records[1].path), (2, &dir.path().join("b.txt")));

    let deletion = report.deletion.as_ref().unwrap();
    assert_eq!(deletion.freed_bytes, 5);
    assert!(deletion.failures.is_empty());
    assert!(!dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.txt").exists());
    assert!(dir.path().join("c.txt").exists());
    assert_eq!(report.stage, Stage::Deleted);
}

#[test]
fn test_sort_order_controls_listing() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("one"), b"1");
    write(&dir.path().join("three"), b"333");
    write(&dir.path().join("two"), b"22");

    let ascending = Configuration::builder()
        .root(Some(dir.path()))
        .sort_order(SortOrder::Ascending)
        .build()
        .unwrap();
    let report = run(&ascending, &PipelineOptions::default()).unwrap();
    assert_eq!(report.partition.sizes(), vec![1, 2, 3]);

    let descending = Configuration::builder()
        .root(Some(dir.path()))
        .sort_order(SortOrder::Descending)
        .build()
        .unwrap();
    let report = run(&descending, &PipelineOptions::default()).unwrap();
    assert_eq!(report.partition.sizes(), vec![3, 2, 1]);
}

#[test]
fn test_numbering_spans_sizes_in_listing_order() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("big1"), b"0123456789");
    write(&dir.path().join("big2"), b"0123456789");
    write(&dir.path().join("small1"), b"ab");
    write(&dir.path().join("small2"), b"ab");
    write(&dir.path().join("small3"), b"ab");

    let numbers_for = |order: SortOrder| {
        let config = Configuration::builder()
            .root(Some(dir.path()))
            .sort_order(order)
            .check_duplicates(true)
            .build()
            .unwrap();
        let report = run(&config, &PipelineOptions::default()).unwrap();
        report
            .duplicate_report()
            .unwrap()
            .records()
            .map(|r| (r.number, r.path.file_name().unwrap().to_string_lossy().to_string()))
            .collect::<Vec<_>>()
    };

    assert_eq!(
        numbers_for(SortOrder::Descending),
        vec![
            (1, "big1".to_string()),
            (2, "big2".to_string()),
            (3, "small1".to_string()),
            (4, "small2".to_string()),
            (5, "small3".to_string()),
        ]
    );
    assert_eq!(numbers_for(SortOrder::Ascending)[0], (1, "small1".to_string()));
}

#[test]
fn test_same_size_different_content_is_not_duplicate() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("x"), b"aaaa");
    write(&dir.path().join("y"), b"bbbb");
    write(&dir.path().join("z"), b"aaaa");

    let config = Configuration::builder()
        .root(Some(dir.path()))
        .check_duplicates(true)
        .build()
        .unwrap();
    let report = run(&config, &PipelineOptions::default()).unwrap();

    let groups = &report.duplicate_report().unwrap().groups;
    assert_eq!(groups.len(), 1);
    let names: Vec<_> = groups[0]
        .records
        .iter()
        .map(|r| r.path.file_name().unwrap().to_owned())
        .collect();
    assert_eq!(names, vec!["x", "z"]);
}

#[test]
fn test_empty_files_form_a_group() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("e1"), b"");
    write(&dir.path().join("e2"), b"");

    let config = Configuration::builder()
        .root(Some(dir.path()))
        .check_duplicates(true)
        .build()
        .unwrap();
    let report = run(&config, &PipelineOptions::default()).unwrap();

    let duplicates = report.duplicate_report().unwrap();
    assert_eq!(duplicates.group_count(), 1);
    assert_eq!(duplicates.groups[0].size, 0);
}

#[test]
fn test_parallel_hashing_matches_sequential() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        let content = format!("content-{}", i % 7);
        write(&dir.path().join(format!("d{}/f{:02}", i % 4, i)), content.as_bytes());
    }
    let config = Configuration::builder()
        .root(Some(dir.path()))
        .check_duplicates(true)
        .build()
        .unwrap();

    let sequential = PipelineOptions {
        io_threads: 1,
        ..PipelineOptions::default()
    };
    let parallel = PipelineOptions {
        io_threads: 8,
        ..PipelineOptions::default()
    };

    let a = run(&config, &sequential).unwrap();
    let b = run(&config, &parallel).unwrap();
    assert_eq!(a.duplicate_report(), b.duplicate_report());
}

#[test]
fn test_numbering_is_stable_across_runs() {
    let dir = tempdir().unwrap();
    for i in 0..30 {
        let content = "x".repeat(1 + i % 5) + &(i % 3).to_string();
        write(&dir.path().join(format!("n{}/m{}/f{:02}", i % 3, i % 2, i)), content.as_bytes());
    }
    let config = Configuration::builder()
        .root(Some(dir.path()))
        .sort_order(SortOrder::Ascending)
        .check_duplicates(true)
        .build()
        .unwrap();

    let numbering = |report: &RunReport| -> Vec<(usize, std::path::PathBuf)> {
        report
            .duplicate_report()
            .unwrap()
            .records()
            .map(|r| (r.number, r.path.clone()))
            .collect()
    };

    let first = numbering(&run(&config, &PipelineOptions::default()).unwrap());
    assert!(!first.is_empty());
    assert_eq!(
        first.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
        (1..=first.len()).collect::<Vec<_>>()
    );

    for _ in 0..3 {
        let again = numbering(&run(&config, &PipelineOptions::default()).unwrap());
        assert_eq!(again, first);
    }
}

#[test]
fn test_extension_filter_applies_to_duplicates() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a.jpg"), b"same");
    write(&dir.path().join("b.jpg"), b"same");
    write(&dir.path().join("c.png"), b"same");

    let config = Configuration::builder()
        .root(Some(dir.path()))
        .extension_filter(Some(".jpg"))
        .check_duplicates(true)
        .build()
        .unwrap();
    let report = run(&config, &PipelineOptions::default()).unwrap();

    assert_eq!(report.partition.file_count(), 2);
    assert_eq!(report.duplicate_report().unwrap().record_count(), 2);
}

#[test]
fn test_stage_functions_compose() {
    let dir = hello_world();
    let config = Configuration::builder()
        .root(Some(dir.path()))
        .build()
        .unwrap();
    let options = PipelineOptions::default();

    let outcome = pipeline::scan(&config, &options).unwrap();
    let mut report = RunReport::bucketed(outcome, SortOrder::Ascending);
    assert_eq!(report.stage, Stage::Bucketed);

    report.record_index(pipeline::index(&report.partition, &options));
    let index = report.index.as_ref().unwrap();
    let targets = pipeline::resolve(index, &[2, 2], &options).unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].path, dir.path().join("b.txt"));

    let deletion = pipeline::delete(&targets, &options);
    report.record_deletion(deletion);
    assert_eq!(report.stage, Stage::Deleted);
    assert_eq!(report.deletion.as_ref().unwrap().freed_bytes, 5);
    assert!(dir.path().join("a.txt").exists());
}

#[test]
fn test_missing_root() {
    let dir = tempdir().unwrap();
    let config = Configuration::builder()
        .root(Some(dir.path().join("absent")))
        .build()
        .unwrap();
    assert!(matches!(
        run(&config, &PipelineOptions::default()),
        Err(PipelineError::Scan(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_partial_success() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(&dir.path().join("a"), b"same");
    write(&dir.path().join("b"), b"same");
    let locked = dir.path().join("c");
    write(&locked, b"same");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if File::open(&locked).is_ok() {
        return;
    }

    let config = Configuration::builder()
        .root(Some(dir.path()))
        .check_duplicates(true)
        .build()
        .unwrap();
    let report = run(&config, &PipelineOptions::default()).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    let index = report.index.as_ref().unwrap();
    assert_eq!(index.errors().len(), 1);
    assert_eq!(index.report().record_count(), 2);
    assert_eq!(report.exit_code(), ExitCode::PartialSuccess);
}
