//! JSON-lines records.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use termplot::config::{PlotConfig, XAxisKind};
use termplot::source::{DataSource, SourceError, SourceInput, SourceKind};

fn open(path: &Path) -> Result<DataSource, SourceError> {
    DataSource::open(
        SourceKind::Jsonl,
        &SourceInput::Path(path.to_path_buf()),
        &PlotConfig::default(),
        &HashSet::new(),
    )
}

#[test]
fn nested_objects_flatten_in_first_seen_order() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("log.jsonl");
    fs::write(
        &file,
        concat!(
            r#"{"epoch": 1, "train": {"loss": 0.9, "acc": 0.1}}"#,
            "\n",
            r#"{"epoch": 2, "train": {"loss": 0.7}, "lr": 0.01}"#,
            "\n",
        ),
    )
    .expect("write");

    let mut source = open(&file).expect("open");
    assert_eq!(
        source.all_scalar_names(),
        vec!["epoch", "train.loss", "train.acc", "lr"]
    );

    let lr = source
        .figure(0)
        .expect("figure")
        .get_series(&XAxisKind::Column("epoch".into()), "lr")
        .expect("series");
    assert_eq!(lr.x, vec![2.0]);
    assert_eq!(lr.y, vec![0.01]);
}

#[test]
fn partially_written_last_line_is_skipped() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("log.jsonl");
    fs::write(&file, "{\"loss\": 1}\n{\"loss\": 2}\n{\"loss\": 3").expect("write");

    let mut source = open(&file).expect("open");
    let series = source
        .figure(0)
        .expect("figure")
        .get_series(&XAxisKind::Step, "loss")
        .expect("series");
    assert_eq!(series.y, vec![1.0, 2.0]);
}

#[test]
fn folder_picks_json_and_jsonl_files() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("b.jsonl"), "{\"loss\": 1}\n").expect("write");
    fs::write(tmp.path().join("a.json"), "{\"acc\": 1}\n").expect("write");
    fs::write(tmp.path().join("c.csv"), "x\n1\n").expect("write");

    let source = open(tmp.path()).expect("open");
    assert_eq!(source.len(), 2);
    assert_eq!(source.all_scalar_names(), vec!["acc", "loss"]);
}

#[test]
fn folder_without_records_is_missing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(matches!(open(tmp.path()), Err(SourceError::Missing { .. })));
}
