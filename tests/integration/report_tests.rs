use clap::Parser;
use dupedirs::cli::Cli;
use dupedirs::duplicates::{DirectoryFinder, FinderConfig, FinderError};
use dupedirs::error::ExitCode;
use dupedirs::output::JsonReport;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn run(args: &[&str]) -> ExitCode {
    let mut argv = vec!["dupedirs", "-q", "--no-progress"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    dupedirs::run_app(cli).unwrap()
}

#[test]
fn test_csv_report_rows() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("data");
    let report = dir.path().join("report.csv");
    write(&root.join("a").join("x.txt"), b"hello");
    write(&root.join("b").join("x.txt"), b"hello");

    let code = run(&[
        root.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::Success);

    let content = fs::read_to_string(&report).unwrap();
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["Directory1", "Directory2", "Size (MB)"]
    );

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], root.join("a").to_str().unwrap());
    assert_eq!(&rows[0][1], root.join("b").to_str().unwrap());
    assert_eq!(&rows[0][2], "0.00");
}

#[test]
fn test_csv_report_header_only_without_duplicates() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("data");
    let report = dir.path().join("report.csv");
    write(&root.join("a").join("x.txt"), b"one");
    write(&root.join("b").join("y.txt"), b"two");

    let code = run(&[
        root.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);

    assert_eq!(code, ExitCode::NoDuplicates);
    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        "Directory1,Directory2,Size (MB)\n"
    );
}

#[test]
fn test_json_report_document() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("data");
    let report = dir.path().join("report.json");
    write(&root.join("a").join("x.txt"), b"hello");
    write(&root.join("b").join("x.txt"), b"hello");

    let code = run(&[
        root.to_str().unwrap(),
        "--output",
        "json",
        "--report",
        report.to_str().unwrap(),
    ]);
    assert_eq!(code, ExitCode::Success);

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["pairs"].as_array().unwrap().len(), 1);
    assert_eq!(
        value["pairs"][0]["dir1"],
        root.join("a").to_str().unwrap()
    );
    assert_eq!(value["summary"]["pairs_reported"], 1);
    assert_eq!(value["summary"]["total_bytes"], 5);
    assert_eq!(value["summary"]["files_indexed"], 2);
}

#[test]
fn test_report_is_truncated_on_rerun() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("data");
    let report = dir.path().join("report.csv");
    write(&root.join("a").join("x.txt"), b"hello");
    write(&root.join("b").join("x.txt"), b"hello");
    fs::write(&report, "stale content\nmore stale\n").unwrap();

    run(&[
        root.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);

    let content = fs::read_to_string(&report).unwrap();
    assert!(!content.contains("stale"));
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn test_interrupted_json_report_is_valid() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("data");
    let report = dir.path().join("report.json");
    write(&root.join("a").join("x.txt"), b"hello");
    write(&root.join("b").join("x.txt"), b"hello");

    let finder = DirectoryFinder::new(
        FinderConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true))),
    );
    let mut sink = JsonReport::new(BufWriter::new(File::create(&report).unwrap()));
    let err = finder.find_duplicates(&[root], &mut sink).unwrap_err();
    drop(sink);

    assert!(matches!(err, FinderError::Interrupted));
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["interrupted"], true);
    assert!(value["summary"].is_null());
    assert!(value["pairs"].as_array().unwrap().is_empty());
}
