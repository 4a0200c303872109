use dupedirs::duplicates::{DedupeSummary, DirectoryFinder, DuplicatePairRecord};
use dupedirs::scanner::PREHASH_SIZE;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn find(root: &Path) -> (Vec<DuplicatePairRecord>, DedupeSummary) {
    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    let summary = DirectoryFinder::with_defaults()
        .find_duplicates(&[root.to_path_buf()], &mut rows)
        .unwrap();
    (rows, summary)
}

#[test]
fn test_unique_size_file_keeps_directory_distinct() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a").join("common.txt"), b"common");
    write(&dir.path().join("a").join("extra.txt"), b"a file nobody else has");
    write(&dir.path().join("b").join("common.txt"), b"common");

    let (rows, summary) = find(dir.path());

    assert!(rows.is_empty());
    assert_eq!(summary.index.files_unique_size, 1);
    assert_eq!(summary.index.files_indexed, 3);
}

#[test]
fn test_same_size_different_first_block_never_matches() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a").join("f.bin"), &vec![b'a'; 100]);
    write(&dir.path().join("b").join("f.bin"), &vec![b'b'; 100]);

    let (rows, summary) = find(dir.path());

    assert!(rows.is_empty());
    assert_eq!(summary.index.files_unique_prehash, 2);
    assert_eq!(summary.index.files_full_hashed, 0);
}

#[test]
fn test_difference_past_first_block_is_caught() {
    let dir = tempdir().unwrap();
    let mut content = vec![0u8; PREHASH_SIZE * 4];
    write(&dir.path().join("a").join("f.bin"), &content);
    content[PREHASH_SIZE * 3] = 1;
    write(&dir.path().join("b").join("f.bin"), &content);

    let (rows, summary) = find(dir.path());

    assert!(rows.is_empty());
    assert_eq!(summary.index.files_full_hashed, 2);
}

#[test]
fn test_large_identical_files_match_after_full_hash() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..PREHASH_SIZE * 3).map(|i| (i % 253) as u8).collect();
    write(&dir.path().join("x").join("f.bin"), &content);
    write(&dir.path().join("y").join("f.bin"), &content);
    write(&dir.path().join("x").join("small.txt"), b"tiny");
    write(&dir.path().join("y").join("small.txt"), b"tiny");

    let (rows, summary) = find(dir.path());

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dir1, dir.path().join("x"));
    assert_eq!(rows[0].dir2, dir.path().join("y"));
    assert_eq!(summary.index.files_full_hashed, 2);
    assert_eq!(summary.index.files_unique_size, 0);
}
