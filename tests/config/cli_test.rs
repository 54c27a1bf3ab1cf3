//! Command line to `PlotConfig`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use termplot::cli::Cli;
use termplot::config::file::FileDefaults;
use termplot::config::{
    AxisRange, BackendKind, Cell, CellSelection, LimitDirective, PlotConfig, XAxisKind,
};
use termplot::render::color::PlotColor;
use termplot::source::SourceKind;

fn config(args: &[&str]) -> PlotConfig {
    config_with(args, &FileDefaults::default())
}

fn config_with(args: &[&str], file: &FileDefaults) -> PlotConfig {
    let cli = Cli::try_parse_from(std::iter::once("termplot").chain(args.iter().copied()))
        .expect("arguments should parse");
    cli.into_config(file).expect("config should build")
}

#[test]
fn defaults_without_arguments_read_stdin() {
    let config = config(&[]);
    assert_eq!(config.target, None);
    assert_eq!(config.data_source, Some(SourceKind::StdinCsv));
    assert_eq!(config.backend, BackendKind::Text);
    assert_eq!(config.x_axis, XAxisKind::Step);
    assert_eq!(config.interval, Duration::from_secs(5));
    assert_eq!(config.smooth, None);
    assert_eq!(config.smooth_poly_order, 3);
}

#[test]
fn folder_auto_detects_unless_csv_is_forced() {
    let auto = config(&["runs"]);
    assert_eq!(auto.target, Some(PathBuf::from("runs")));
    assert_eq!(auto.data_source, None);

    let csv = config(&["runs", "--csv"]);
    assert_eq!(csv.data_source, Some(SourceKind::Csv));

    let jsonl = config(&["runs", "--data-source", "jsonl"]);
    assert_eq!(jsonl.data_source, Some(SourceKind::Jsonl));
}

#[test]
fn raster_shorthand_selects_raster_backend() {
    assert_eq!(config(&["runs", "-r"]).backend, BackendKind::Raster);
    assert_eq!(
        config(&["runs", "--backend", "raster-terminal"]).backend,
        BackendKind::RasterTerminal
    );
}

#[test]
fn dark_theme_fills_unset_colors_only() {
    let dark = config(&["runs", "--dark-theme"]);
    assert_eq!(dark.canvas_color, Some(PlotColor::Black));
    assert_eq!(dark.axes_color, Some(PlotColor::Black));
    assert_eq!(dark.ticks_color, Some(PlotColor::White));

    let explicit = config(&["runs", "--dark-theme", "--canvas-color", "#102030"]);
    assert_eq!(explicit.canvas_color, Some(PlotColor::Rgb(0x10, 0x20, 0x30)));
    assert_eq!(explicit.ticks_color, Some(PlotColor::White));
}

#[test]
fn bare_scale_flag_applies_everywhere() {
    let config = config(&["runs", "--xlog", "1,2", "2,1", "--ylog"]);
    assert_eq!(config.ylog, CellSelection::All);
    assert_eq!(
        config.xlog,
        CellSelection::Cells(vec![Cell::new(1, 2), Cell::new(2, 1)])
    );
    assert!(config.xlog.matches(2, 1));
    assert!(!config.xlog.matches(1, 1));
    assert_eq!(config.xsymlog, CellSelection::None);
}

#[test]
fn bare_smooth_uses_default_factor() {
    assert_eq!(config(&["runs", "-s"]).smooth, Some(0.05));
    assert_eq!(config(&["runs", "--smooth", "0.3"]).smooth, Some(0.3));
    assert!(Cli::try_parse_from(["termplot", "runs", "--smooth", "1.5"]).is_err());
}

#[test]
fn limits_parse_with_and_without_cell() {
    let config = config(&["runs", "--xlim", "1,1=0,10", "5,6"]);
    assert_eq!(
        config.xlim,
        vec![
            LimitDirective {
                cell: Some(Cell::new(1, 1)),
                range: AxisRange { min: 0.0, max: 10.0 },
            },
            LimitDirective {
                cell: None,
                range: AxisRange { min: 5.0, max: 6.0 },
            },
        ]
    );
    assert!(Cli::try_parse_from(["termplot", "runs", "--xlim", "foo"]).is_err());
}

#[test]
fn consolidate_counts_repetitions() {
    assert_eq!(config(&["runs"]).consolidate, 0);
    assert_eq!(config(&["runs", "-c"]).consolidate, 1);
    assert_eq!(config(&["runs", "-cc"]).consolidate, 2);
    assert_eq!(
        config(&["runs", "--consolidate", "--consolidate"]).consolidate,
        2
    );
}

#[test]
fn xaxis_column_name_is_kept() {
    assert_eq!(
        config(&["runs", "-x", "epoch"]).x_axis,
        XAxisKind::Column("epoch".into())
    );
    assert_eq!(config(&["runs", "-x", "index"]).x_axis, XAxisKind::Step);
}

#[test]
fn command_line_overrides_file_defaults() {
    let file: FileDefaults = toml::from_str(
        r#"
[display]
backend = "raster"
grid = true
canvas_color = "blue"

[refresh]
interval_secs = 0.5
"#,
    )
    .expect("defaults should parse");

    let from_file = config_with(&["runs"], &file);
    assert_eq!(from_file.backend, BackendKind::Raster);
    assert!(from_file.grid);
    assert_eq!(from_file.canvas_color, Some(PlotColor::Blue));
    assert_eq!(from_file.interval, Duration::from_millis(500));

    let overridden = config_with(
        &["runs", "--backend", "text", "-n", "2", "--canvas-color", "red"],
        &file,
    );
    assert_eq!(overridden.backend, BackendKind::Text);
    assert_eq!(overridden.interval, Duration::from_secs(2));
    assert_eq!(overridden.canvas_color, Some(PlotColor::Red));
}

#[test]
fn invalid_file_color_is_a_config_error() {
    let file: FileDefaults = toml::from_str("[display]\nticks_color = \"plaid\"\n").expect("parse");
    let cli = Cli::try_parse_from(["termplot", "runs"]).expect("parse");
    assert!(cli.into_config(&file).is_err());
}

#[test]
fn negative_interval_is_rejected() {
    let cli = Cli::try_parse_from(["termplot", "runs", "--interval=-1"]).expect("parse");
    assert!(cli.into_config(&FileDefaults::default()).is_err());
}
