//! Tests for `src/logging.rs`.

use termplot::logging::LoggingGuard;

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_with_file_creates_logs_dir() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("nested").join("logs");
    assert!(!logs_dir.exists());

    // The global subscriber can be installed once per process, so this is
    // the only test in this binary that initialises logging.
    let guard = termplot::logging::init_with_file(&logs_dir, true).expect("init");
    tracing::info!("logging initialised");
    drop(guard);

    assert!(logs_dir.is_dir(), "logs directory should be created");
    let written = std::fs::read_dir(&logs_dir)
        .expect("read logs dir")
        .filter_map(Result::ok)
        .any(|entry| entry.file_name().to_string_lossy().starts_with("termplot.log"));
    assert!(written, "a rotated log file should exist");
}
