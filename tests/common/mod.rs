//! Shared fixtures for the scenario integration tests.
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn vibec_dir() -> TempDir {
    TempDir::new().expect("tempdir")
}

/// Invoke the compiled `vibec` binary against `workdir`, appending `args`.
pub fn run_vibec(workdir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_vibec"))
        .arg(format!("--workdir={}", workdir.display()))
        .args(args)
        .output()
        .expect("spawn vibec")
}
