//! Cleaning real files in a temporary directory.

use std::fs;
use std::path::Path;

use items_purge::{backup_path, clean_file, CleanOptions, ErrorCode, FsStorage, Grammar};

const SCENARIO: &str = "items { count = 2
  item { id = 1001  name = Wrench      pile = Garage }
  item { id = 2002  name = EmptyBottle pile = PermanentlyDeletedItems }
}
";

fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn scenario_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("items.txt");
    fs::write(&target, SCENARIO).unwrap();

    let cleaned = clean_file(&FsStorage, &target, &Grammar::default(), &CleanOptions::default())
        .unwrap();

    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "items { count = 1
  item { id = 1001  name = Wrench      pile = Garage }
}
"
    );
    assert_eq!(fs::read_to_string(dir.path().join("items00.txt")).unwrap(), SCENARIO);
    assert_eq!(cleaned.report.backup, Some(dir.path().join("items00.txt")));
    assert_eq!(names(dir.path()), vec!["items.txt", "items00.txt"]);
}

#[test]
fn twelve_runs_keep_ten_backups() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("items.txt");

    for run in 0..12 {
        let content = format!(
            "items {{ count = 1\n  item {{ id = run{run} pile = PermanentlyDeletedItems }}\n}}\n"
        );
        fs::write(&target, &content).unwrap();

        clean_file(&FsStorage, &target, &Grammar::default(), &CleanOptions::default()).unwrap();

        assert_eq!(fs::read_to_string(backup_path(&target, 0)).unwrap(), content);
        assert_eq!(fs::read_to_string(&target).unwrap(), "items { count = 0\n}\n");
    }

    let mut expected = vec!["items.txt".to_string()];
    expected.extend((0..10).map(|n| format!("items{n:02}.txt")));
    expected.sort();
    assert_eq!(names(dir.path()), expected);

    // Oldest surviving backup is the third run.
    let oldest = fs::read_to_string(backup_path(&target, 9)).unwrap();
    assert!(oldest.contains("run2"));
}

#[test]
fn parse_error_leaves_directory_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("items.txt");
    fs::write(&target, "items { item { id = 1 pile = PermanentlyDeletedItems }").unwrap();

    let err = clean_file(&FsStorage, &target, &Grammar::default(), &CleanOptions::default())
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Parse);
    assert_eq!(err.code().exit_code(), 3);
    assert_eq!(names(dir.path()), vec!["items.txt"]);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("items.txt");

    let err = clean_file(&FsStorage, &target, &Grammar::default(), &CleanOptions::default())
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Io);
    assert!(names(dir.path()).is_empty());
}

#[test]
fn custom_backup_limit() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("items.txt");
    fs::write(&target, SCENARIO).unwrap();
    let options = CleanOptions::new().with_max_backups(2);

    for _ in 0..4 {
        clean_file(&FsStorage, &target, &Grammar::default(), &options).unwrap();
    }

    assert_eq!(names(dir.path()), vec!["items.txt", "items00.txt", "items01.txt"]);
}
