//! Workspace Manager: persists artifacts and maintains the current
//! workspace.

use crate::error::{Result, VibecError};
use crate::model::Artifact;
use std::fs;
use std::path::{Path, PathBuf};

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| VibecError::FilesystemWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, content).map_err(|e| VibecError::FilesystemWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// For each artifact, write the byte-exact content at both the per-stage
/// snapshot path and the merged current-workspace path. Both writes must
/// succeed for the caller to consider this prompt's artifacts durable; an
/// error is raised before subsequent prompts run.
pub fn write(
    artifacts: &[Artifact],
    stack: &str,
    prompt_basename: &str,
    output_root: &Path,
) -> Result<()> {
    let snapshot_dir = output_root.join("stacks").join(stack).join(prompt_basename);
    let current_dir = output_root.join("current");

    for artifact in artifacts {
        write_file(&snapshot_dir.join(&artifact.path), &artifact.content)?;
        write_file(&current_dir.join(&artifact.path), &artifact.content)?;
    }
    Ok(())
}

/// Ensure `<output_root>/current` exists. If `<output_root>/bootstrap`
/// exists, copy its tree into `current` to seed the workspace.
pub fn initialize(output_root: &Path) -> Result<()> {
    let current = output_root.join("current");
    fs::create_dir_all(&current).map_err(|e| VibecError::FilesystemWrite {
        path: current.clone(),
        source: e,
    })?;

    let bootstrap = output_root.join("bootstrap");
    if bootstrap.is_dir() {
        copy_tree(&bootstrap, &current)?;
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in fs::read_dir(src).map_err(|e| VibecError::FilesystemWrite {
        path: src.to_path_buf(),
        source: e,
    })? {
        let entry = entry.map_err(|e| VibecError::FilesystemWrite {
            path: src.to_path_buf(),
            source: e,
        })?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            fs::create_dir_all(&to).map_err(|e| VibecError::FilesystemWrite {
                path: to.clone(),
                source: e,
            })?;
            copy_tree(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| VibecError::FilesystemWrite {
                path: to.clone(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Rebuild `current` by clearing it and replaying all stage snapshots whose
/// stage number is strictly less than `start_stage`, ascending, across all
/// configured stacks, each replay overwriting existing files (Last-Wins).
/// Used when the engine is invoked with `--start` greater than the first
/// stage so context files resolve correctly.
pub fn reconstruct(output_root: &Path, stacks: &[String], start_stage: u64) -> Result<()> {
    let current = output_root.join("current");
    if current.is_dir() {
        fs::remove_dir_all(&current).map_err(|e| VibecError::FilesystemWrite {
            path: current.clone(),
            source: e,
        })?;
    }
    fs::create_dir_all(&current).map_err(|e| VibecError::FilesystemWrite {
        path: current.clone(),
        source: e,
    })?;

    let bootstrap = output_root.join("bootstrap");
    if bootstrap.is_dir() {
        copy_tree(&bootstrap, &current)?;
    }

    let mut snapshot_dirs: Vec<(u64, PathBuf)> = Vec::new();
    for stack in stacks {
        let stack_dir = output_root.join("stacks").join(stack);
        let entries = match fs::read_dir(&stack_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(VibecError::FilesystemWrite {
                    path: stack_dir,
                    source: e,
                })
            }
        };
        for entry in entries {
            let entry = entry.map_err(|e| VibecError::FilesystemWrite {
                path: stack_dir.clone(),
                source: e,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(number) = leading_number(&name) {
                if number < start_stage {
                    snapshot_dirs.push((number, entry.path()));
                }
            }
        }
    }
    snapshot_dirs.sort_by_key(|(n, _)| *n);

    for (_, dir) in snapshot_dirs {
        copy_tree(&dir, &current)?;
    }
    Ok(())
}

fn leading_number(name: &str) -> Option<u64> {
    let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_produces_identical_bytes_in_both_locations() {
        let tmp = TempDir::new().unwrap();
        let artifacts = vec![Artifact {
            path: "a.js".to_string(),
            content: b"console.log(\"x\")".to_vec(),
        }];
        write(&artifacts, "core", "001_test", tmp.path()).unwrap();

        let snapshot = fs::read(tmp.path().join("stacks/core/001_test/a.js")).unwrap();
        let current = fs::read(tmp.path().join("current/a.js")).unwrap();
        assert_eq!(snapshot, b"console.log(\"x\")");
        assert_eq!(current, b"console.log(\"x\")");
    }

    #[test]
    fn last_wins_across_stages() {
        let tmp = TempDir::new().unwrap();
        write(
            &[Artifact {
                path: "shared.js".to_string(),
                content: b"first".to_vec(),
            }],
            "core",
            "001_first",
            tmp.path(),
        )
        .unwrap();
        write(
            &[Artifact {
                path: "shared.js".to_string(),
                content: b"second".to_vec(),
            }],
            "core",
            "002_second",
            tmp.path(),
        )
        .unwrap();

        assert_eq!(fs::read(tmp.path().join("current/shared.js")).unwrap(), b"second");
        assert_eq!(
            fs::read(tmp.path().join("stacks/core/001_first/shared.js")).unwrap(),
            b"first"
        );
    }

    #[test]
    fn reconstruct_replays_snapshots_below_start_stage() {
        let tmp = TempDir::new().unwrap();
        write(
            &[Artifact {
                path: "shared.js".to_string(),
                content: b"first".to_vec(),
            }],
            "core",
            "001_first",
            tmp.path(),
        )
        .unwrap();
        write(
            &[Artifact {
                path: "shared.js".to_string(),
                content: b"second".to_vec(),
            }],
            "core",
            "002_second",
            tmp.path(),
        )
        .unwrap();

        // Clobber current to prove reconstruct rebuilds it from scratch.
        fs::write(tmp.path().join("current/shared.js"), b"stale").unwrap();

        reconstruct(tmp.path(), &["core".to_string()], 2).unwrap();
        assert_eq!(fs::read(tmp.path().join("current/shared.js")).unwrap(), b"first");
    }
}
