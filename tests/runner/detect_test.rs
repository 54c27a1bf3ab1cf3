//! Source auto-detection order.

use std::fs;

use termplot::config::PlotConfig;
use termplot::runner::{detect_source, RunError};
use termplot::source::tensorboard::encode_record;
use termplot::source::tensorboard::proto::{Event, Summary, SummaryValue};
use termplot::source::SourceKind;

fn event_bytes() -> Vec<u8> {
    encode_record(&Event {
        wall_time: 1.0,
        step: 0,
        summary: Some(Summary {
            value: vec![SummaryValue {
                tag: "loss".into(),
                simple_value: Some(1.0),
                tensor: None,
            }],
        }),
    })
}

#[test]
fn csv_file_is_csv() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("m.csv");
    fs::write(&file, "loss\n1\n").expect("write");
    assert_eq!(
        detect_source(&file, &PlotConfig::default()).expect("detect"),
        SourceKind::Csv
    );
}

#[test]
fn event_folder_is_tensorboard() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("events.out.tfevents.1.host"), event_bytes()).expect("write");
    assert_eq!(
        detect_source(tmp.path(), &PlotConfig::default()).expect("detect"),
        SourceKind::Tensorboard
    );
}

#[test]
fn single_event_file_is_tensorboard() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("events.out.tfevents.1.host");
    fs::write(&file, event_bytes()).expect("write");
    assert_eq!(
        detect_source(&file, &PlotConfig::default()).expect("detect"),
        SourceKind::Tensorboard
    );
}

#[test]
fn jsonl_extension_tries_jsonl_first() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("log.jsonl");
    fs::write(&file, "{\"loss\": 1}\n").expect("write");
    assert_eq!(
        detect_source(&file, &PlotConfig::default()).expect("detect"),
        SourceKind::Jsonl
    );
}

#[test]
fn folder_of_jsonl_files_falls_through_to_jsonl() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("a.jsonl"), "{\"loss\": 1}\n").expect("write");
    assert_eq!(
        detect_source(tmp.path(), &PlotConfig::default()).expect("detect"),
        SourceKind::Jsonl
    );
}

#[test]
fn empty_folder_is_undetermined() {
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        detect_source(tmp.path(), &PlotConfig::default()),
        Err(RunError::UndeterminedSource(_))
    ));
}

#[test]
fn non_missing_errors_stop_detection() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("m.csv");
    fs::write(&file, "").expect("write");
    assert!(matches!(
        detect_source(&file, &PlotConfig::default()),
        Err(RunError::Source(termplot::source::SourceError::Processing(_)))
    ));
}
