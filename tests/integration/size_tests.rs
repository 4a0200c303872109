use dupedirs::duplicates::{DirectoryFinder, DuplicatePairRecord, BYTES_PER_MB};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_size_is_recursive_subtree_of_first_directory() {
    let dir = tempdir().unwrap();
    let x = dir.path().join("x");
    let y = dir.path().join("y");
    write(&x.join("readme.md"), &[b'r'; 1000]);
    write(&y.join("readme.md"), &[b'r'; 1000]);
    write(&x.join("a").join("data.bin"), &[7u8; 3000]);
    write(&y.join("a").join("data.bin"), &[7u8; 3000]);

    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    let summary = DirectoryFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()], &mut rows)
        .unwrap();

    let size_of = |d: &Path| {
        rows.iter()
            .find(|r| r.dir1 == d)
            .map(|r| r.size_mb)
            .unwrap()
    };
    assert_eq!(size_of(&x.join("a")), 3000.0 / BYTES_PER_MB);
    assert_eq!(size_of(&x), 4000.0 / BYTES_PER_MB);

    // Nested levels are each counted in full.
    assert_eq!(summary.engine.total_bytes, 7000);
    assert!((summary.total_mb() - 7000.0 / BYTES_PER_MB).abs() < 1e-12);
}

#[test]
fn test_one_mebibyte_reports_one() {
    let dir = tempdir().unwrap();
    let payload = vec![42u8; 1024 * 1024];
    write(&dir.path().join("a").join("big.bin"), &payload);
    write(&dir.path().join("b").join("big.bin"), &payload);

    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    DirectoryFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()], &mut rows)
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].size_mb, 1.0);
    assert_eq!(rows[0].size_display(), "1.00");
}
