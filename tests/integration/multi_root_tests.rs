use dupedirs::duplicates::{DirectoryFinder, DuplicatePairRecord, FinderError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn find(roots: &[PathBuf]) -> Vec<DuplicatePairRecord> {
    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    DirectoryFinder::with_defaults()
        .find_duplicates(roots, &mut rows)
        .unwrap();
    rows
}

#[test]
fn test_duplicates_across_roots() {
    let dir = tempdir().unwrap();
    let r1 = dir.path().join("backup-2023");
    let r2 = dir.path().join("backup-2024");
    write(&r1.join("photos").join("cat.jpg"), b"meow");
    write(&r2.join("photos").join("cat.jpg"), b"meow");
    write(&r2.join("notes.txt"), b"only in 2024");

    let rows = find(&[r1.clone(), r2.clone()]);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dir1, r1.join("photos"));
    assert_eq!(rows[0].dir2, r2.join("photos"));
}

#[test]
fn test_overlapping_roots_match_single_root() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a").join("f.txt"), b"shared");
    write(&dir.path().join("b").join("f.txt"), b"shared");

    let single = find(&[dir.path().to_path_buf()]);
    let overlapping = find(&[dir.path().to_path_buf(), dir.path().join("a")]);
    let repeated = find(&[dir.path().to_path_buf(), dir.path().to_path_buf()]);

    assert_eq!(single.len(), 1);
    assert_eq!(single, overlapping);
    assert_eq!(single, repeated);
}

#[test]
fn test_parent_segments_in_root_do_not_pair_a_directory_with_itself() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sub")).unwrap();
    write(&dir.path().join("a").join("f.txt"), b"only copy");

    let dotted = dir.path().join("sub").join("..");
    let rows = find(&[dir.path().to_path_buf(), dotted]);

    assert!(rows.is_empty());
}

#[test]
fn test_no_matches_across_unrelated_roots() {
    let dir = tempdir().unwrap();
    let r1 = dir.path().join("one");
    let r2 = dir.path().join("two");
    write(&r1.join("a.txt"), b"apples");
    write(&r2.join("b.txt"), b"oranges");

    assert!(find(&[r1, r2]).is_empty());
}

#[test]
fn test_missing_root_is_error() {
    let dir = tempdir().unwrap();
    let mut rows: Vec<DuplicatePairRecord> = Vec::new();

    let err = DirectoryFinder::with_defaults()
        .find_duplicates(
            &[dir.path().to_path_buf(), dir.path().join("missing")],
            &mut rows,
        )
        .unwrap_err();

    assert!(matches!(err, FinderError::PathNotFound(_)));
    assert!(rows.is_empty());
}

#[test]
fn test_file_root_is_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    write(&file, b"not a directory");
    let mut rows: Vec<DuplicatePairRecord> = Vec::new();

    let err = DirectoryFinder::with_defaults()
        .find_duplicates(&[file], &mut rows)
        .unwrap_err();

    assert!(matches!(err, FinderError::NotADirectory(_)));
}

#[test]
fn test_summary_counts() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a").join("f.txt"), b"same");
    write(&dir.path().join("b").join("f.txt"), b"same");
    write(&dir.path().join("c").join("g.txt"), b"different");

    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    let summary = DirectoryFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()], &mut rows)
        .unwrap();

    assert_eq!(summary.index.roots, 1);
    assert_eq!(summary.index.files_indexed, 3);
    assert_eq!(summary.index.files_skipped, 0);
    assert_eq!(summary.engine.grouping.total_directories, 3);
    assert_eq!(summary.engine.grouping.candidate_groups, 1);
    assert_eq!(summary.pairs_reported(), 1);
    assert!(summary.has_duplicates());
}
