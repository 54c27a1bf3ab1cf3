//! Filesystem watching and latest-subdirectory selection.

use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use filetime::{set_file_mtime, FileTime};
use termplot::monitor::fs::latest_subdirectory;
use termplot::monitor::{FilesystemMonitor, Monitor, MonitorError};
use termplot::source::SourceInput;

#[test]
fn latest_picks_the_most_recently_modified_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");
    for (name, secs) in [("old", 1_000), ("new", 3_000), ("mid", 2_000)] {
        let dir = tmp.path().join(name);
        fs::create_dir(&dir).expect("mkdir");
        set_file_mtime(&dir, FileTime::from_unix_time(secs, 0)).expect("mtime");
    }
    let file = tmp.path().join("newest_file.txt");
    fs::write(&file, "not a directory").expect("write");
    set_file_mtime(&file, FileTime::from_unix_time(9_000, 0)).expect("mtime");

    let latest = latest_subdirectory(tmp.path()).expect("latest");
    assert_eq!(latest, tmp.path().join("new"));
}

#[test]
fn folder_without_subdirectories_has_no_latest() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("a.csv"), "x\n1\n").expect("write");
    assert!(matches!(
        latest_subdirectory(tmp.path()),
        Err(MonitorError::NoSubdirectory(_))
    ));
}

#[test]
fn monitor_latest_reports_a_path_input() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::create_dir(tmp.path().join("run1")).expect("mkdir");
    let mut monitor = FilesystemMonitor::new(tmp.path()).expect("watch");
    assert_eq!(monitor.root(), tmp.path());
    assert!(matches!(
        monitor.latest(),
        Ok(SourceInput::Path(path)) if path == tmp.path().join("run1")
    ));
    monitor.stop();
}

#[test]
fn writes_below_the_root_set_the_signal() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let run = tmp.path().join("run1");
    fs::create_dir(&run).expect("mkdir");
    let mut monitor = FilesystemMonitor::new(tmp.path()).expect("watch");
    monitor.reset_condition();

    fs::write(run.join("metrics.csv"), "loss\n1\n").expect("write");

    let deadline = Instant::now() + Duration::from_secs(5);
    while !monitor.should_refresh() {
        assert!(Instant::now() < deadline, "no change observed");
        thread::sleep(Duration::from_millis(20));
    }
    monitor.wait_till_new_modification().expect("pending change");
    monitor.stop();
}

#[test]
fn missing_root_fails_at_construction() {
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(matches!(
        FilesystemMonitor::new(&tmp.path().join("absent")),
        Err(MonitorError::Watch(_))
    ));
}

#[test]
fn touching_a_file_sets_the_signal() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "loss\n1\n").expect("write");
    let mut monitor = FilesystemMonitor::new(tmp.path()).expect("watch");
    monitor.reset_condition();

    set_file_mtime(&file, FileTime::from_unix_time(5_000, 0)).expect("mtime");

    let deadline = Instant::now() + Duration::from_secs(5);
    while !monitor.should_refresh() {
        assert!(Instant::now() < deadline, "metadata change not observed");
        thread::sleep(Duration::from_millis(20));
    }
    monitor.stop();
}
