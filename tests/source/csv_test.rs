//! CSV and TSV tables.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use termplot::config::{PlotConfig, XAxisKind};
use termplot::source::{DataSource, SourceError, SourceInput, SourceKind, ValueKind};

fn open_with(path: &Path, config: &PlotConfig) -> Result<DataSource, SourceError> {
    DataSource::open(
        SourceKind::Csv,
        &SourceInput::Path(path.to_path_buf()),
        config,
        &HashSet::new(),
    )
}

fn open(path: &Path) -> Result<DataSource, SourceError> {
    open_with(path, &PlotConfig::default())
}

#[test]
fn columns_keep_file_order_and_step_is_an_index() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "step,loss,acc\n10,0.9,0.1\n20,0.7,0.4\n30,0.5,0.6\n").expect("write");

    let mut source = open(&file).expect("open");
    assert_eq!(source.all_scalar_names(), vec!["step", "loss", "acc"]);

    let series = source
        .figure(0)
        .expect("figure")
        .get_series(&XAxisKind::Step, "loss")
        .expect("series");
    assert_eq!(series.x, vec![0.0, 1.0, 2.0]);
    assert_eq!(series.y, vec![0.9, 0.7, 0.5]);
}

#[test]
fn named_column_becomes_the_x_axis() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "epoch,loss\n1,0.9\n2,0.7\n").expect("write");

    let mut source = open(&file).expect("open");
    let figure = source.figure(0).expect("figure");
    let series = figure
        .get_series(&XAxisKind::Column("epoch".into()), "loss")
        .expect("series");
    assert_eq!(series.x, vec![1.0, 2.0]);

    let err = figure
        .get_series(&XAxisKind::Column("wall".into()), "loss")
        .expect_err("unknown column");
    assert!(matches!(err, SourceError::UnsupportedXAxis { .. }));
}

#[test]
fn time_axis_is_a_usage_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "loss\n1\n2\n").expect("write");

    let mut source = open(&file).expect("open");
    let err = source
        .figure(0)
        .expect("figure")
        .get_series(&XAxisKind::Time, "loss")
        .expect_err("time axis");
    assert!(matches!(err, SourceError::UnsupportedXAxis { .. }));
}

#[test]
fn blank_cells_drop_the_whole_pair() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "epoch,loss\n1,0.9\n2,\n,0.5\n4,nan\n5,0.1\n").expect("write");

    let mut source = open(&file).expect("open");
    let series = source
        .figure(0)
        .expect("figure")
        .get_series(&XAxisKind::Column("epoch".into()), "loss")
        .expect("series");
    assert_eq!(series.x.len(), series.y.len());
    assert_eq!(series.x, vec![1.0, 5.0]);
    assert!(series.x.iter().chain(&series.y).all(|v| v.is_finite()));
}

#[test]
fn text_column_is_non_numeric() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "loss,note\n1,ok\n2,bad\n").expect("write");

    let mut source = open(&file).expect("open");
    let err = source
        .figure(0)
        .expect("figure")
        .get_series(&XAxisKind::Step, "note")
        .expect_err("text column");
    assert!(matches!(err, SourceError::NonNumeric { ref series } if series == "note"));
}

#[test]
fn dates_make_a_temporal_column() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "day,visits\n2024-01-01,3\n2024-01-02,5\n").expect("write");

    let mut source = open(&file).expect("open");
    let series = source
        .figure(0)
        .expect("figure")
        .get_series(&XAxisKind::Column("day".into()), "visits")
        .expect("series");
    assert_eq!(series.x_kind, ValueKind::Temporal);
    assert_eq!(series.x[1] - series.x[0], 86_400.0);
}

#[test]
fn tsv_extension_selects_tabs() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.tsv");
    fs::write(&file, "loss\tacc\n1\t2\n").expect("write");

    let source = open(&file).expect("open");
    assert_eq!(source.all_scalar_names(), vec!["loss", "acc"]);
}

#[test]
fn folder_of_tables_gives_one_figure_per_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("b.csv"), "loss\n1\n").expect("write");
    fs::write(tmp.path().join("a.csv"), "acc\n1\n").expect("write");
    fs::write(tmp.path().join("readme.md"), "# runs").expect("write");

    let mut source = open(tmp.path()).expect("open");
    assert_eq!(source.len(), 2);
    assert!(source.figure(0).expect("figure").title().ends_with("a.csv"));
    assert_eq!(source.all_scalar_names(), vec!["acc", "loss"]);
}

#[test]
fn event_file_is_not_a_table() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("events.out.tfevents.1.host");
    fs::write(&file, "step,loss\n1,2\n").expect("write");
    assert!(matches!(open(&file), Err(SourceError::Missing { .. })));
}

#[test]
fn empty_file_fails_after_retries() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "").expect("write");
    assert!(matches!(open(&file), Err(SourceError::Processing(_))));
}

#[test]
fn appended_rows_are_picked_up_on_refresh() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "loss\n1\n").expect("write");

    let mut source = open(&file).expect("open");
    let len = |source: &mut DataSource| {
        source
            .figure(0)
            .expect("figure")
            .get_series(&XAxisKind::Step, "loss")
            .expect("series")
            .len()
    };
    assert_eq!(len(&mut source), 1);

    fs::write(&file, "loss\n1\n2\n3\n").expect("rewrite");
    assert_eq!(len(&mut source), 3);
}

#[test]
fn filters_and_exclusions_shape_the_names() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "train_loss,val_loss,train_acc,note\n1,2,3,x\n").expect("write");

    let config = PlotConfig {
        whitelist: vec!["loss".into(), "acc".into()],
        blacklist: vec!["val".into()],
        ..PlotConfig::default()
    };
    let source = DataSource::open(
        SourceKind::Csv,
        &SourceInput::Path(file),
        &config,
        &HashSet::from(["train_acc".to_owned()]),
    )
    .expect("open");
    assert_eq!(source.all_scalar_names(), vec!["train_loss"]);
}
