//! TOML defaults file loading.

use std::fs;

use termplot::config::file::{load_file_defaults, resolve_file_defaults};
use termplot::config::BackendKind;

#[test]
fn empty_file_uses_defaults() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("config.toml");
    fs::write(&path, "").expect("write");

    let defaults = load_file_defaults(&path).expect("load");
    assert_eq!(defaults.display.backend, None);
    assert!(!defaults.display.dark_theme);
    assert!((defaults.refresh.interval_secs - 5.0).abs() < f64::EPSILON);
    assert_eq!(defaults.logging.log_dir, None);
}

#[test]
fn sections_are_read() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("config.toml");
    fs::write(
        &path,
        r#"
[display]
backend = "raster-terminal"
dark_theme = true

[logging]
log_dir = "/tmp/termplot-logs"
"#,
    )
    .expect("write");

    let defaults = load_file_defaults(&path).expect("load");
    assert_eq!(defaults.display.backend, Some(BackendKind::RasterTerminal));
    assert!(defaults.display.dark_theme);
    assert_eq!(
        defaults.logging.log_dir.as_deref(),
        Some(std::path::Path::new("/tmp/termplot-logs"))
    );
}

#[test]
fn malformed_file_is_an_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("config.toml");
    fs::write(&path, "[display\nbackend = ").expect("write");

    let err = load_file_defaults(&path).expect_err("malformed");
    assert!(format!("{err:#}").contains("failed to parse config"));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(resolve_file_defaults(Some(&tmp.path().join("absent.toml"))).is_err());
}
