//! Context Assembler: turns one prompt into the single string sent to the
//! LLM Client.

use crate::error::VibecError;
use crate::model::{Prompt, TestResult};
use std::path::Path;
use tracing::warn;

pub const SYSTEM_INSTRUCTION: &str = concat!(
    "Generate code files in this exact format for each file:\n",
    "File: path/to/file\n```lang\ncontent\n```. Ensure every response ",
    "includes ALL files requested in the prompt's ## Output: sections. ",
    "Do not skip any requested outputs."
);

/// Read each workspace-relative name from a prompt's `## Context:` line and
/// render a block of `File: <name>` fenced sections. Missing files are
/// warned and skipped, not fatal.
pub fn build_context_block(names: &[String], workspace_dir: &Path) -> String {
    let mut block = String::new();
    for name in names {
        let path = workspace_dir.join(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                block.push_str(&format!("File: {name}\n```\n{content}\n```\n"));
            }
            Err(_) => {
                let e = VibecError::ContextFileMissing { path: path.clone() };
                warn!(error = %e, "skipping missing context file");
            }
        }
    }
    block
}

/// Concatenate static plugin texts in order, each preceded by a blank line.
pub fn build_plugin_block(static_plugins: &[String]) -> String {
    let mut block = String::new();
    for text in static_plugins {
        block.push('\n');
        block.push_str(text);
    }
    block
}

/// Render the prior test output as a fenced "## Test Output" section.
pub fn build_feedback_block(test_result: Option<&TestResult>) -> String {
    match test_result {
        None => String::new(),
        Some(result) => format!("\n\n## Test Output\n```\n{}\n```\n", result.output),
    }
}

/// Assemble the full sandwich prompt: system instruction, prompt body
/// (raw prompt + plugin block + feedback block), context block, then the
/// system instruction and prompt body again. Repetition mitigates
/// long-context attention drift by placing instructions and prompt at both
/// ends.
pub fn build_prompt(
    prompt: &Prompt,
    workspace_dir: &Path,
    static_plugins: &[String],
    test_feedback: Option<&TestResult>,
) -> String {
    let context_block = build_context_block(&prompt.context, workspace_dir);
    let plugin_block = build_plugin_block(static_plugins);
    let feedback_block = build_feedback_block(test_feedback);

    let body = format!("{}{}{}", prompt.text, plugin_block, feedback_block);

    format!(
        "{system}\n\n{body}\n\n{context_block}\n\n{system}\n\n{body}",
        system = SYSTEM_INSTRUCTION,
        body = body,
        context_block = context_block,
    )
}
