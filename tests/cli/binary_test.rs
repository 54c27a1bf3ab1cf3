//! Exit codes and output of the built binary.

use std::fs;

use assert_cmd::Command;

fn termplot() -> Command {
    let mut cmd = Command::cargo_bin("termplot").expect("binary should build");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn malformed_limit_is_a_usage_error() {
    termplot().args(["runs", "--xlim", "foo"]).assert().code(2);
}

#[test]
fn unsupported_option_fails_before_plotting() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = termplot()
        .arg(tmp.path())
        .arg("--ysymlog")
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--ysymlog"), "stderr: {stderr}");
}

#[test]
fn undetectable_folder_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    termplot().arg(tmp.path()).assert().code(1);
}

#[test]
fn piped_csv_is_drawn_once() {
    let output = termplot()
        .args([
            "--colorless",
            "--terminal-width",
            "60",
            "--terminal-height",
            "12",
        ])
        .write_stdin("loss,acc\n0.9,0.1\n0.7,0.4\n0.5,0.6\n")
        .output()
        .expect("run");
    assert!(output.status.success(), "{output:?}");
    assert!(!output.stdout.is_empty());
}

#[test]
fn raw_bytes_are_a_png() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "loss\n3\n2\n1\n").expect("write");

    let output = termplot()
        .arg(&file)
        .args(["--raster", "--as-raw-bytes", "--plotsize", "200,150"])
        .output()
        .expect("run");
    assert!(output.status.success(), "{output:?}");
    assert!(output.stdout.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[test]
fn config_file_must_exist_when_named() {
    let tmp = tempfile::tempdir().expect("tempdir");
    termplot()
        .arg(tmp.path())
        .arg("--config")
        .arg(tmp.path().join("missing.toml"))
        .assert()
        .code(1);
}

/// Install a `timg` stand-in running `script` into `dir/bin`.
#[cfg(unix)]
fn fake_viewer(dir: &std::path::Path, script: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("bin");
    fs::create_dir_all(&bin).expect("mkdir");
    let viewer = bin.join("timg");
    fs::write(&viewer, format!("#!/bin/sh\n{script}\n")).expect("write viewer");
    fs::set_permissions(&viewer, fs::Permissions::from_mode(0o755)).expect("chmod");
    bin
}

#[cfg(unix)]
#[test]
fn raster_terminal_raw_bytes_are_only_the_png() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let bin = fake_viewer(tmp.path(), "cat > /dev/null");

    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "loss\n3\n2\n1\n").expect("write");

    let output = termplot()
        .env("PATH", &bin)
        .arg(&file)
        .args([
            "--backend",
            "raster-terminal",
            "--as-raw-bytes",
            "--plotsize",
            "200,150",
        ])
        .output()
        .expect("run");
    assert!(output.status.success(), "{output:?}");
    assert!(output.stdout.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[cfg(unix)]
#[test]
fn viewer_that_quits_early_is_reported() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let bin = fake_viewer(tmp.path(), "exit 3");
    let file = tmp.path().join("metrics.csv");
    fs::write(&file, "loss\n3\n2\n1\n").expect("write");

    termplot()
        .env("PATH", &bin)
        .arg(&file)
        .args(["--backend", "raster-terminal", "--plotsize", "200,150"])
        .assert()
        .code(1);
}
