//! Test Harness: executes a user-supplied test command with output capture
//! and a success/failure verdict. Quoting and word-splitting are entirely
//! the caller's responsibility; the harness does not interpret the
//! command.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

pub struct TestOutcome {
    pub success: bool,
    pub output: String,
}

/// Run `test_cmd` through the platform shell, teeing stdout/stderr to the
/// operator's terminal while also capturing them. With no configured
/// command, returns success with empty output.
pub fn run(test_cmd: Option<&str>) -> TestOutcome {
    let Some(test_cmd) = test_cmd else {
        return TestOutcome {
            success: true,
            output: String::new(),
        };
    };

    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(test_cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return TestOutcome {
                success: false,
                output: format!("failed to spawn test command: {e}"),
            }
        }
    };

    let mut stdout = child.stdout.take().expect("piped");
    let mut stderr = child.stderr.take().expect("piped");

    let (tx, rx) = mpsc::channel();
    let out_tx = tx.clone();
    let stdout_thread = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
        print!("{}", String::from_utf8_lossy(&buf));
        let _ = out_tx.send(("stdout", buf));
    });
    let stderr_thread = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf);
        eprint!("{}", String::from_utf8_lossy(&buf));
        let _ = tx.send(("stderr", buf));
    });

    let mut captured = std::collections::HashMap::new();
    for _ in 0..2 {
        if let Ok((which, buf)) = rx.recv() {
            captured.insert(which, buf);
        }
    }
    let _ = stdout_thread.join();
    let _ = stderr_thread.join();

    let status = match child.wait() {
        Ok(status) => status,
        Err(e) => {
            return TestOutcome {
                success: false,
                output: format!("failed to wait on test command: {e}"),
            }
        }
    };

    let mut output = String::new();
    if let Some(buf) = captured.get("stdout") {
        output.push_str(&String::from_utf8_lossy(buf));
    }
    if let Some(buf) = captured.get("stderr") {
        output.push_str(&String::from_utf8_lossy(buf));
    }

    TestOutcome {
        success: status.success(),
        output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_test_command_is_success_with_empty_output() {
        let outcome = run(None);
        assert!(outcome.success);
        assert_eq!(outcome.output, "");
    }

    #[test]
    fn captures_stdout_and_reports_exit_code() {
        let outcome = run(Some("echo hello"));
        assert!(outcome.success);
        assert!(outcome.output.contains("hello"));
    }

    #[test]
    fn non_zero_exit_is_failure() {
        let outcome = run(Some("exit 1"));
        assert!(!outcome.success);
    }
}
