//! End-to-end runs against a fake op-tracing runtime

use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

/// Path to the fake runtime script, made executable if the checkout lost the bit
fn fake_runtime() -> PathBuf {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fake_runtime.sh");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).unwrap().permissions();
        if perms.mode() & 0o111 == 0 {
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).unwrap();
        }
    }

    path
}

#[test]
fn test_stdout_log_matches_child_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let out_log = dir.path().join("out.log");
    let err_log = dir.path().join("err.log");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.arg("--runtime")
        .arg(fake_runtime())
        .arg("--stdout")
        .arg(&out_log)
        .arg("--stderr")
        .arg(&err_log)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&out_log).unwrap(),
        "hello from stdout\nsecond line\n"
    );
}

#[test]
fn test_stderr_log_keeps_raw_trace() {
    let dir = tempfile::tempdir().unwrap();
    let err_log = dir.path().join("err.log");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.arg("--runtime")
        .arg(fake_runtime())
        .arg("--stdout")
        .arg(dir.path().join("out.log"))
        .arg("--stderr")
        .arg(&err_log)
        .assert()
        .success();

    let raw = fs::read_to_string(&err_log).unwrap();
    assert_eq!(raw.lines().count(), 7);
    assert!(raw.contains("op_run_microtask"));
    assert!(raw.contains("warning: this is not a trace line"));
}

#[test]
fn test_live_table_shows_dispatched_ops() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.arg("--runtime")
        .arg(fake_runtime())
        .arg("--stdout")
        .arg(dir.path().join("out.log"))
        .arg("--stderr")
        .arg(dir.path().join("err.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("dispatched"))
        .stdout(predicate::str::contains("op_read_file_async"))
        .stdout(predicate::str::contains("op_bootstrap_no_color"))
        .stdout(predicate::str::contains("op_run_microtask").not())
        .stdout(predicate::str::contains("op_orphan").not())
        .stdout(predicate::str::contains("Child process exited with status 0"));
}

#[test]
fn test_child_stdout_not_echoed_to_terminal() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.arg("--runtime")
        .arg(fake_runtime())
        .arg("--stdout")
        .arg(dir.path().join("out.log"))
        .arg("--stderr")
        .arg(dir.path().join("err.log"))
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from stdout").not());
}

#[test]
fn test_exit_code_is_propagated() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.arg("--runtime")
        .arg(fake_runtime())
        .arg("--stdout")
        .arg(dir.path().join("out.log"))
        .arg("--stderr")
        .arg(dir.path().join("err.log"))
        .arg("--")
        .arg("3")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Child process exited with status 3"));
}

#[test]
fn test_default_log_paths_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.current_dir(dir.path())
        .arg("--runtime")
        .arg(fake_runtime())
        .assert()
        .success();

    assert!(dir.path().join("stdout.log").exists());
    assert!(dir.path().join("stderr.log").exists());
}

#[test]
fn test_existing_log_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let out_log = dir.path().join("out.log");
    fs::write(&out_log, "stale content from an earlier run that is much longer\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.arg("--runtime")
        .arg(fake_runtime())
        .arg("--stdout")
        .arg(&out_log)
        .arg("--stderr")
        .arg(dir.path().join("err.log"))
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&out_log).unwrap(),
        "hello from stdout\nsecond line\n"
    );
}

#[test]
fn test_help_exits_before_spawning() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.current_dir(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--stdout"))
        .stdout(predicate::str::contains("--stderr"));

    assert!(!dir.path().join("stdout.log").exists());
}

#[test]
fn test_missing_runtime_fails() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("demon");
    cmd.current_dir(dir.path())
        .arg("--runtime")
        .arg(dir.path().join("no-such-runtime"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to spawn"));
}
