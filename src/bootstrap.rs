//! Bootstrap Driver: makes the engine self-hosting by re-invoking the
//! compiled binary once per stage and promoting newly emitted
//! compiler/test-runner binaries.

use crate::config::Config;
use crate::error::{Result, VibecError};
use crate::prompt_store::list_prompts;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

const COMPILER_NAME: &str = "vibec";
const TEST_RUNNER_NAME: &str = "run-tests";

/// Ensure the seed compiler/test-runner exist in `current`, then invoke
/// the engine once per stage number, promoting any updated binaries the
/// stage produced before moving to the next one.
pub fn run(cfg: &Config) -> Result<()> {
    let current = cfg.output.join("current");
    let compiler_path = current.join("bin").join(COMPILER_NAME);
    let test_runner_path = current.join(TEST_RUNNER_NAME);

    seed_if_missing(&compiler_path, &cfg.workdir.join("bin").join(COMPILER_NAME))?;
    seed_if_missing(&test_runner_path, &cfg.workdir.join("bin").join(TEST_RUNNER_NAME))?;

    let prompts = list_prompts(&cfg.workdir, &cfg.stacks)?;
    let highest = prompts.iter().map(|p| p.number).max().unwrap_or(0);

    let start = cfg.start.unwrap_or(1);
    let end = cfg.end.unwrap_or(highest);

    for stage in start..=end {
        info!(stage, "bootstrap: invoking current compiler");
        let status = Command::new(&compiler_path)
            .arg(format!("--start={stage}"))
            .arg(format!("--end={stage}"))
            .arg(format!("--stacks={}", cfg.stacks.join(",")))
            .arg(format!("--workdir={}", cfg.workdir.display()))
            .arg(format!("--output={}", cfg.output.display()))
            .args(test_cmd_args(cfg))
            .status()
            .map_err(|e| VibecError::FilesystemWrite {
                path: compiler_path.clone(),
                source: e,
            })?;

        if !status.success() {
            return Err(VibecError::TestFailure {
                iterations: cfg.iterations,
            });
        }

        promote_if_present(
            &stage_snapshot_dir(cfg, stage).join("bin").join(COMPILER_NAME),
            &compiler_path,
        )?;
        promote_if_present(
            &stage_snapshot_dir(cfg, stage).join(TEST_RUNNER_NAME),
            &test_runner_path,
        )?;
    }

    Ok(())
}

fn test_cmd_args(cfg: &Config) -> Vec<String> {
    match &cfg.test_cmd {
        Some(cmd) => vec![format!("--testCmd={cmd}")],
        None => Vec::new(),
    }
}

/// The stage snapshot directory for the highest-numbered prompt at `stage`
/// across all configured stacks, mirroring the persisted layout
/// `stacks/<stack>/<NNN_name>/…`.
fn stage_snapshot_dir(cfg: &Config, stage: u64) -> PathBuf {
    for stack in &cfg.stacks {
        let stack_dir = cfg.output.join("stacks").join(stack);
        if let Ok(entries) = std::fs::read_dir(&stack_dir) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(&format!("{stage:03}_")) {
                    return entry.path();
                }
            }
        }
    }
    PathBuf::new()
}

fn seed_if_missing(target: &Path, seed: &Path) -> Result<()> {
    if target.exists() {
        return Ok(());
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| VibecError::FilesystemWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    if seed.exists() {
        std::fs::copy(seed, target).map_err(|e| VibecError::FilesystemWrite {
            path: target.to_path_buf(),
            source: e,
        })?;
        make_executable(target)?;
    } else {
        warn!(target = %target.display(), "no seed binary found to bootstrap with");
    }
    Ok(())
}

fn promote_if_present(candidate: &Path, target: &Path) -> Result<()> {
    if !candidate.exists() {
        return Ok(());
    }
    info!(from = %candidate.display(), to = %target.display(), "promoting self-compiled binary");
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| VibecError::FilesystemWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::copy(candidate, target).map_err(|e| VibecError::FilesystemWrite {
        path: target.to_path_buf(),
        source: e,
    })?;
    make_executable(target)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .map_err(|e| VibecError::FilesystemWrite {
            path: path.to_path_buf(),
            source: e,
        })?
        .permissions();
    perms.set_mode(perms.mode() | 0o111);
    std::fs::set_permissions(path, perms).map_err(|e| VibecError::FilesystemWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
