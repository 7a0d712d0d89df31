//! Prompt Store: enumerates prompt files and plugin files under a root.

use crate::error::{Result, VibecError};
use crate::model::{Plugin, Prompt};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn prompt_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)_[^/]+\.md$").unwrap())
}

fn context_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^## Context:\s*(.+)$").unwrap())
}

fn output_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^## Output:\s*(.+)$").unwrap())
}

/// Scan `<root>/stacks/<stack>/` for each named stack, in the given order,
/// and return prompts sorted ascending by stage number, stable by stack
/// order then filename.
pub fn list_prompts(root: &Path, stacks: &[String]) -> Result<Vec<Prompt>> {
    let mut all = Vec::new();
    for stack in stacks {
        let dir = root.join("stacks").join(stack);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(VibecError::PromptScanFailure {
                    stack: stack.clone(),
                    source: e,
                })
            }
        };
        let mut names: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| VibecError::PromptScanFailure {
                stack: stack.clone(),
                source: e,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if prompt_name_re().is_match(&name) {
                names.push(name);
            }
        }
        names.sort();
        for name in names {
            let caps = prompt_name_re().captures(&name).expect("matched above");
            let number: u64 = caps[1].parse().expect("digits matched by regex");
            let path = dir.join(&name);
            let text = std::fs::read_to_string(&path).map_err(|e| VibecError::PromptScanFailure {
                stack: stack.clone(),
                source: e,
            })?;
            let basename = name.trim_end_matches(".md").to_string();
            let context = parse_context(&text);
            let outputs = parse_outputs(&text);
            all.push(Prompt {
                stack: stack.clone(),
                number,
                path,
                basename,
                text,
                context,
                outputs,
            });
        }
    }
    all.sort_by_key(|p| p.number);
    Ok(all)
}

fn parse_context(text: &str) -> Vec<String> {
    match context_line_re().captures(text) {
        Some(caps) => caps[1].split(',').map(|s| s.trim().to_string()).collect(),
        None => Vec::new(),
    }
}

fn parse_outputs(text: &str) -> Vec<String> {
    output_line_re()
        .captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Scan `<root>/stacks/<stack>/plugins/` for static (`.md`) and dynamic
/// (non-`.md`) plugin files, each list sorted lexicographically. A missing
/// plugins directory yields empty lists, not an error.
pub fn list_plugins(root: &Path, stack: &str) -> Result<(Vec<Plugin>, Vec<Plugin>)> {
    let dir = root.join("stacks").join(stack).join("plugins");
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), Vec::new())),
        Err(e) => {
            return Err(VibecError::PromptScanFailure {
                stack: stack.to_string(),
                source: e,
            })
        }
    };

    let mut statics = Vec::new();
    let mut dynamics = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| VibecError::PromptScanFailure {
            stack: stack.to_string(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        let plugin = Plugin {
            path: path.clone(),
            filename: filename.clone(),
        };
        if path.extension().and_then(|e| e.to_str()) == Some("md") {
            statics.push(plugin);
        } else {
            dynamics.push(plugin);
        }
    }
    statics.sort_by(|a, b| a.filename.cmp(&b.filename));
    dynamics.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok((statics, dynamics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn discovery_closure_and_order_stability() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "stacks/core/002_second.md", "# two\n");
        write(tmp.path(), "stacks/core/001_first.md", "# one\n");
        write(tmp.path(), "stacks/core/README.md", "not a prompt\n");
        write(tmp.path(), "stacks/core/plugins/helper.md", "static\n");

        let first = list_prompts(tmp.path(), &["core".to_string()]).unwrap();
        let second = list_prompts(tmp.path(), &["core".to_string()]).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].number, 1);
        assert_eq!(first[1].number, 2);
        let first_names: Vec<_> = first.iter().map(|p| p.basename.clone()).collect();
        let second_names: Vec<_> = second.iter().map(|p| p.basename.clone()).collect();
        assert_eq!(first_names, second_names);
    }

    #[test]
    fn missing_plugins_dir_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "stacks/core/001_first.md", "# one\n");
        let (statics, dynamics) = list_plugins(tmp.path(), "core").unwrap();
        assert!(statics.is_empty());
        assert!(dynamics.is_empty());
    }

    #[test]
    fn context_and_output_directives_parsed() {
        let text = "# T\n## Context: a.js, b.js\n## Output: out.js\n";
        assert_eq!(parse_context(text), vec!["a.js", "b.js"]);
        assert_eq!(parse_outputs(text), vec!["out.js"]);
    }
}
