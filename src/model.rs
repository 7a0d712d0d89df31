//! Core data model: prompts, plugins, and artifacts.
//!
//! These values are created once at engine start and never mutated; the
//! current workspace (see `workspace.rs`) is the sole piece of mutable
//! cross-prompt state.

use std::path::PathBuf;

/// One Markdown prompt file, identified by `(stack, number)`.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub stack: String,
    pub number: u64,
    /// Path to the prompt file on disk.
    pub path: PathBuf,
    /// `<NNN_name>` with the `.md` extension stripped; used as the snapshot
    /// directory name.
    pub basename: String,
    pub text: String,
    /// Workspace-relative paths named by `## Context:` lines.
    pub context: Vec<String>,
    /// Workspace-relative paths named by `## Output:` lines.
    pub outputs: Vec<String>,
}

/// A dynamic or static plugin file under `stacks/<stack>/plugins/`.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub path: PathBuf,
    pub filename: String,
}

/// A `(relative-path, content-bytes)` pair parsed from one LLM completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub content: Vec<u8>,
}

/// Captured test output spliced into a retry attempt's prompt.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub success: bool,
    pub output: String,
}
