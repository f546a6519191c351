//! Deploy script executor tests
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tokio_test::{assert_err, assert_ok};

use release_dispatcher::deploy::script::ScriptDeployer;
use release_dispatcher::deploy::Deployer;
use release_dispatcher::errors::DispatchError;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_passes_version_and_environment() {
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let script = write_script(
        dir.path(),
        "deploy.sh",
        &format!("echo \"$1 $2\" > {}", args_file.display()),
    );

    let deployer = ScriptDeployer::new(&script, "staging");
    assert_ok!(deployer.deploy("v1.2.3").await);

    let recorded = fs::read_to_string(&args_file).unwrap();
    assert_eq!(recorded.trim(), "v1.2.3 staging");
    assert_eq!(deployer.environment(), "staging");
}

#[tokio::test]
async fn test_non_zero_exit_fails() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "deploy.sh", "echo failing >&2\nexit 3");

    let err = assert_err!(ScriptDeployer::new(&script, "prod").deploy("v1").await);
    match err {
        DispatchError::DeployError(detail) => assert!(detail.contains("3"), "{detail}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_script_fails() {
    let dir = tempfile::tempdir().unwrap();
    let deployer = ScriptDeployer::new(dir.path().join("does-not-exist.sh"), "prod");

    let err = assert_err!(deployer.deploy("v1").await);
    assert!(err.to_string().contains("Failed to run deploy script"));
}

#[tokio::test]
async fn test_timeout_kills_script() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "deploy.sh", "exec sleep 30");

    let deployer =
        ScriptDeployer::new(&script, "prod").with_timeout(Some(Duration::from_millis(200)));

    let started = Instant::now();
    let err = assert_err!(deployer.deploy("v1").await);
    assert!(err.to_string().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_without_timeout_waits_for_completion() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("done");
    let script = write_script(
        dir.path(),
        "deploy.sh",
        &format!("sleep 0.2\ntouch {}", marker.display()),
    );

    assert_ok!(ScriptDeployer::new(&script, "prod").deploy("v1").await);
    assert!(marker.exists());
}
