//! Error taxonomy for the compilation engine.
//!
//! Component boundaries return `Result<T, VibecError>` so the Stage Engine
//! can pattern-match on the variant to decide retry vs. propagate, rather
//! than inspecting opaque error strings. `main.rs` is the only place an
//! error is turned into an `anyhow::Error` chain and a process exit code.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VibecError {
    #[error("invalid configuration: {key}: {message}")]
    InvalidConfig { key: String, message: String },

    #[error("could not read stack directory {stack}: {source}")]
    PromptScanFailure {
        stack: String,
        #[source]
        source: std::io::Error,
    },

    #[error("context file missing: {path}")]
    ContextFileMissing { path: PathBuf },

    #[error("plugin load failed: {plugin}: {message}")]
    PluginLoadFailure { plugin: String, message: String },

    #[error("plugin runtime error: {plugin}: {message}")]
    PluginRuntimeError { plugin: String, message: String },

    #[error("plugin timed out after {timeout_ms}ms: {plugin}")]
    PluginTimeout { plugin: String, timeout_ms: u64 },

    #[error("LLM transport error (status {status:?}): {message}")]
    LLMTransport {
        status: Option<u16>,
        message: String,
    },

    #[error("LLM authentication error: {message}")]
    LLMAuth { message: String },

    #[error("parser yielded zero artifacts from a non-empty completion")]
    ParseEmpty,

    #[error("filesystem write failed at {path}: {source}")]
    FilesystemWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("test command failed after {iterations} iteration(s)")]
    TestFailure { iterations: u32 },
}

pub type Result<T> = std::result::Result<T, VibecError>;
