#![cfg(unix)]

use dupedirs::duplicates::{DirectoryFinder, DuplicatePairRecord, FinderConfig};
use dupedirs::scanner::WalkerConfig;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_symlinked_file_counts_as_its_target() {
    let dir = tempdir().unwrap();
    let outside = dir.path().join("outside");
    let root = dir.path().join("root");
    write(&outside.join("target.txt"), b"hello");
    write(&root.join("b").join("x.txt"), b"hello");
    fs::create_dir_all(root.join("a")).unwrap();
    symlink(outside.join("target.txt"), root.join("a").join("link.txt")).unwrap();

    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    DirectoryFinder::with_defaults()
        .find_duplicates(&[root.clone()], &mut rows)
        .unwrap();

    // The link is indexed under the directory it was found in.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dir1, root.join("a"));
    assert_eq!(rows[0].dir2, root.join("b"));
}

#[test]
fn test_dangling_symlink_is_skipped() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a").join("x.txt"), b"hello");
    write(&dir.path().join("b").join("x.txt"), b"hello");
    symlink(
        dir.path().join("nowhere.txt"),
        dir.path().join("a").join("broken.txt"),
    )
    .unwrap();

    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    let summary = DirectoryFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()], &mut rows)
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(summary.index.files_skipped, 1);
    assert_eq!(summary.index.files_indexed, 2);
}

#[test]
fn test_symlinked_directory_not_descended_by_default() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    write(&dir.path().join("elsewhere").join("f.txt"), b"linked");
    write(&root.join("real").join("f.txt"), b"linked");
    symlink(dir.path().join("elsewhere"), root.join("linked")).unwrap();

    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    DirectoryFinder::with_defaults()
        .find_duplicates(&[root.clone()], &mut rows)
        .unwrap();
    assert!(rows.is_empty());

    let finder = DirectoryFinder::new(
        FinderConfig::default().with_walker_config(WalkerConfig::new(true, false)),
    );
    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    finder.find_duplicates(&[root.clone()], &mut rows).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dir1, root.join("linked"));
    assert_eq!(rows[0].dir2, root.join("real"));
}

#[test]
fn test_two_links_to_one_large_file_pair_their_directories() {
    let dir = tempdir().unwrap();
    let outside = dir.path().join("outside");
    let root = dir.path().join("root");
    write(&outside.join("big.bin"), &vec![3u8; 64 * 1024]);
    fs::create_dir_all(root.join("a")).unwrap();
    fs::create_dir_all(root.join("b")).unwrap();
    symlink(outside.join("big.bin"), root.join("a").join("one.bin")).unwrap();
    symlink(outside.join("big.bin"), root.join("b").join("two.bin")).unwrap();

    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    let summary = DirectoryFinder::with_defaults()
        .find_duplicates(&[root.clone()], &mut rows)
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dir1, root.join("a"));
    assert_eq!(rows[0].dir2, root.join("b"));
    assert_eq!(summary.index.files_full_hashed, 2);
}
