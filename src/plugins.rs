//! Plugin Runner: invokes dynamic plugins with a bounded wall-clock budget
//! and an isolation boundary.
//!
//! A dynamic plugin is a subprocess contract rather than an in-process
//! dynamic-library load: `<pluginRunner> <path>` receives the context
//! record as one JSON document on stdin. The timeout race is a worker
//! thread racing a timer thread over an `mpsc` channel, matching the
//! fully-synchronous subprocess style used elsewhere in this crate; the
//! loser is detached and its result discarded.

use crate::config::Config;
use crate::error::VibecError;
use crate::model::{Plugin, TestResult};
use serde::Serialize;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{error, warn};

/// Immutable context record passed to a plugin invocation.
#[derive(Serialize)]
pub struct PluginContext<'a> {
    pub stack: &'a str,
    pub prompt_number: u64,
    pub prompt_content: &'a str,
    pub working_dir: &'a str,
    pub test_cmd: Option<&'a str>,
    pub test_result: Option<PluginTestResult<'a>>,
}

#[derive(Serialize)]
pub struct PluginTestResult<'a> {
    pub success: bool,
    pub output: &'a str,
}

impl<'a> PluginContext<'a> {
    pub fn new(
        cfg: &'a Config,
        stack: &'a str,
        prompt_number: u64,
        prompt_content: &'a str,
        working_dir: &'a str,
        test_result: Option<&'a TestResult>,
    ) -> Self {
        PluginContext {
            stack,
            prompt_number,
            prompt_content,
            working_dir,
            test_cmd: cfg.test_cmd.as_deref(),
            test_result: test_result.map(|r| PluginTestResult {
                success: r.success,
                output: &r.output,
            }),
        }
    }
}

/// Run each dynamic plugin, in filename order, sequentially. A plugin that
/// fails to spawn, exits non-zero, or exceeds `timeout_ms` is logged and
/// skipped; it never prevents remaining plugins from running, and its
/// return value (if any) is discarded — plugins communicate only through
/// side effects on the workspace.
pub fn run_dynamic_plugins(plugins: &[Plugin], ctx_json: &str, runner: &str, timeout_ms: u64) {
    for plugin in plugins {
        if let Err(e) = invoke_with_timeout(plugin, ctx_json, runner, timeout_ms) {
            error!(plugin = %plugin.filename, error = %e, "plugin failed, skipping");
        }
    }
}

fn invoke_with_timeout(
    plugin: &Plugin,
    ctx_json: &str,
    runner: &str,
    timeout_ms: u64,
) -> Result<(), VibecError> {
    let (tx, rx) = mpsc::channel();
    let runner = runner.to_string();
    let path = plugin.path.clone();
    let filename = plugin.filename.clone();
    let ctx_json = ctx_json.to_string();

    let handle = std::thread::spawn(move || {
        let result = run_once(&filename, &runner, &path, &ctx_json);
        // The receiver may already have timed out and moved on; a send
        // error just means nobody is listening anymore.
        let _ = tx.send(result);
    });

    match rx.recv_timeout(Duration::from_millis(timeout_ms)) {
        Ok(result) => {
            // Join is best-effort cleanup; the thread has already finished
            // by the time it sent its result.
            let _ = handle.join();
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(plugin = %plugin.filename, "abandoning timed-out plugin thread");
            Err(VibecError::PluginTimeout {
                plugin: plugin.filename.clone(),
                timeout_ms,
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(VibecError::PluginRuntimeError {
            plugin: plugin.filename.clone(),
            message: "plugin thread panicked".to_string(),
        }),
    }
}

fn run_once(
    filename: &str,
    runner: &str,
    path: &std::path::Path,
    ctx_json: &str,
) -> Result<(), VibecError> {
    // `runner` may itself be a command line (e.g. "deno run"), so it is
    // split the same way the teacher splits its LM invocation command
    // rather than assumed to be a single executable name.
    let mut parts = shell_words::split(runner).map_err(|e| VibecError::PluginLoadFailure {
        plugin: filename.to_string(),
        message: e.to_string(),
    })?;
    if parts.is_empty() {
        return Err(VibecError::PluginLoadFailure {
            plugin: filename.to_string(),
            message: "pluginRunner is empty".to_string(),
        });
    }
    let program = parts.remove(0);

    let mut child = Command::new(program)
        .args(parts)
        .arg(path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VibecError::PluginLoadFailure {
            plugin: filename.to_string(),
            message: e.to_string(),
        })?;

    if let Some(stdin) = child.stdin.as_mut() {
        let _ = stdin.write_all(ctx_json.as_bytes());
    }

    let output = child
        .wait_with_output()
        .map_err(|e| VibecError::PluginRuntimeError {
            plugin: filename.to_string(),
            message: e.to_string(),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(VibecError::PluginRuntimeError {
            plugin: filename.to_string(),
            message: format!(
                "exit status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Plugin;
    use std::path::{Path, PathBuf};
    use std::time::Instant;
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, body: &str) -> Plugin {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        Plugin {
            path,
            filename: name.to_string(),
        }
    }

    #[test]
    fn nonexistent_runner_is_a_load_failure() {
        let plugin = Plugin {
            path: PathBuf::from("a.sh"),
            filename: "a.sh".to_string(),
        };
        let err = invoke_with_timeout(&plugin, "{}", "definitely-not-a-real-executable", 50)
            .expect_err("nonexistent runner should fail to load");
        assert!(matches!(err, VibecError::PluginLoadFailure { .. }));
    }

    #[test]
    fn nonzero_exit_is_a_runtime_error() {
        let tmp = TempDir::new().unwrap();
        let plugin = write_script(tmp.path(), "fails.sh", "exit 7\n");
        let err = invoke_with_timeout(&plugin, "{}", "sh", 2000).unwrap_err();
        assert!(matches!(err, VibecError::PluginRuntimeError { .. }));
    }

    #[test]
    fn exceeding_timeout_yields_plugin_timeout() {
        let tmp = TempDir::new().unwrap();
        let plugin = write_script(tmp.path(), "sleeper.sh", "sleep 2\n");
        let err = invoke_with_timeout(&plugin, "{}", "sh", 50).unwrap_err();
        assert!(matches!(err, VibecError::PluginTimeout { .. }));
    }

    /// Scenario 6: a timed-out plugin is abandoned, logged, and does not
    /// prevent a later plugin in the same batch from running.
    #[test]
    fn timed_out_plugin_does_not_block_the_next_one() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("marker");
        let sleeper = write_script(tmp.path(), "a_sleeper.sh", "sleep 2\n");
        let recorder = write_script(
            tmp.path(),
            "b_recorder.sh",
            &format!("touch {}\n", marker.display()),
        );

        let started = Instant::now();
        run_dynamic_plugins(&[sleeper, recorder], "{}", "sh", 100);
        let elapsed = started.elapsed();

        // The sleeping plugin is abandoned after ~100ms rather than the
        // full 2s it would otherwise take to exit on its own.
        assert!(elapsed < Duration::from_secs(1));
        assert!(marker.exists(), "second plugin should still have run");
    }
}
