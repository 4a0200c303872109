use dupedirs::duplicates::{DirectoryFinder, DuplicatePairRecord};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn find(root: &Path) -> Vec<DuplicatePairRecord> {
    let mut rows: Vec<DuplicatePairRecord> = Vec::new();
    DirectoryFinder::with_defaults()
        .find_duplicates(&[root.to_path_buf()], &mut rows)
        .unwrap();
    rows
}

fn pair_set(rows: &[DuplicatePairRecord]) -> BTreeSet<(PathBuf, PathBuf)> {
    rows.iter()
        .map(|r| (r.dir1.clone(), r.dir2.clone()))
        .collect()
}

#[test]
fn test_single_matching_pair_stops_at_shared_parent() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    write(&a.join("x.txt"), b"hello");
    write(&b.join("x.txt"), b"hello");

    let rows = find(dir.path());

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dir1, a);
    assert_eq!(rows[0].dir2, b);
}

#[test]
fn test_escalation_continues_while_parents_match() {
    let dir = tempdir().unwrap();
    let x = dir.path().join("x");
    let y = dir.path().join("y");
    write(&x.join("a").join("x.txt"), b"hello");
    write(&y.join("a").join("x.txt"), b"hello");
    write(&x.join("readme.md"), b"readme");
    write(&y.join("readme.md"), b"readme");

    let rows = find(dir.path());

    let expected: BTreeSet<_> = [(x.join("a"), y.join("a")), (x.clone(), y.clone())]
        .into_iter()
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(pair_set(&rows), expected);
}

#[test]
fn test_escalation_halts_when_parents_differ() {
    let dir = tempdir().unwrap();
    let x = dir.path().join("x");
    let y = dir.path().join("y");
    write(&x.join("a").join("x.txt"), b"hello");
    write(&y.join("a").join("x.txt"), b"hello");
    write(&x.join("readme.md"), b"first");
    write(&y.join("readme.md"), b"second");

    let rows = find(dir.path());

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dir1, x.join("a"));
    assert_eq!(rows[0].dir2, y.join("a"));
}

#[test]
fn test_parents_without_own_files_are_not_reported() {
    // /a and /b hold only `sub`; their subtrees match but they have no
    // direct files, so only the `sub` pair is reported.
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    write(&a.join("sub").join("one.bin"), b"H1");
    write(&a.join("sub").join("two.bin"), b"H2");
    write(&b.join("sub").join("one.bin"), b"H1");
    write(&b.join("sub").join("two.bin"), b"H2");

    let rows = find(dir.path());

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].dir1, a.join("sub"));
    assert_eq!(rows[0].dir2, b.join("sub"));
    assert!(!pair_set(&rows).contains(&(a, b)));
}

#[test]
fn test_file_names_do_not_matter() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a").join("one.txt"), b"payload");
    write(&dir.path().join("b").join("renamed.dat"), b"payload");

    assert_eq!(find(dir.path()).len(), 1);
}

#[test]
fn test_repeated_content_within_directory_is_a_set() {
    // {H, H} in one directory and {H} in the other are the same set.
    let dir = tempdir().unwrap();
    write(&dir.path().join("a").join("1.txt"), b"same");
    write(&dir.path().join("a").join("2.txt"), b"same");
    write(&dir.path().join("b").join("1.txt"), b"same");

    assert_eq!(find(dir.path()).len(), 1);
}

#[test]
fn test_subset_is_not_duplicate() {
    let dir = tempdir().unwrap();
    write(&dir.path().join("a").join("1.txt"), b"one");
    write(&dir.path().join("a").join("2.txt"), b"two");
    write(&dir.path().join("b").join("1.txt"), b"one");

    assert!(find(dir.path()).is_empty());
}

#[test]
fn test_three_identical_directories() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "c"] {
        write(&dir.path().join(name).join("f.txt"), b"triple");
    }

    let rows = find(dir.path());
    let p = |n: &str| dir.path().join(n);
    let expected: BTreeSet<_> = [(p("a"), p("b")), (p("a"), p("c")), (p("b"), p("c"))]
        .into_iter()
        .collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(pair_set(&rows), expected);
}

#[test]
fn test_no_unordered_pair_reported_twice() {
    // Two levels of matching content in two mirrored trees, plus a third
    // matching level below. Several candidate pairs lead to the same parents.
    let dir = tempdir().unwrap();
    for side in ["left", "right"] {
        let base = dir.path().join(side);
        write(&base.join("top.txt"), b"top");
        write(&base.join("mid").join("mid.txt"), b"mid");
        write(&base.join("mid").join("low").join("low.txt"), b"low");
        write(&base.join("other").join("other.txt"), b"other");
    }

    let rows = find(dir.path());
    let unique = pair_set(&rows);
    let unordered: BTreeSet<_> = rows
        .iter()
        .map(|r| {
            if r.dir1 <= r.dir2 {
                (r.dir1.clone(), r.dir2.clone())
            } else {
                (r.dir2.clone(), r.dir1.clone())
            }
        })
        .collect();

    assert_eq!(unique.len(), rows.len());
    assert_eq!(unordered.len(), rows.len());
    // low, mid, other and the two side roots.
    assert_eq!(rows.len(), 4);
    assert!(unique.contains(&(dir.path().join("left"), dir.path().join("right"))));
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempdir().unwrap();
    for side in ["x", "y", "z"] {
        let base = dir.path().join(side);
        write(&base.join("a").join("f.txt"), b"alpha");
        write(&base.join("b").join("g.txt"), b"beta");
    }

    let first = find(dir.path());
    let second = find(dir.path());

    assert!(!first.is_empty());
    assert_eq!(first, second);
}
