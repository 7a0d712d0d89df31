//! Response Parser: deterministically extracts artifacts from a raw LLM
//! completion using a strict fenced-block grammar.
//!
//! `File: <path>\n```[lang]?\n<content>\n```` — applied as repeated
//! non-overlapping matches. Duplicates at the same path within one
//! completion: the later occurrence supersedes (Last-Wins within a single
//! response).

use crate::model::Artifact;
use regex::Regex;
use std::sync::OnceLock;

fn artifact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)File:[ \t]*([^\n]+)\n```[^\n]*\n(.*?)\n```").unwrap()
    })
}

pub fn parse(completion: &str) -> Vec<Artifact> {
    let mut ordered_paths: Vec<String> = Vec::new();
    let mut by_path: std::collections::HashMap<String, Vec<u8>> = std::collections::HashMap::new();

    for caps in artifact_re().captures_iter(completion) {
        let path = caps[1].trim().to_string();
        let content = caps[2].as_bytes().to_vec();
        if !by_path.contains_key(&path) {
            ordered_paths.push(path.clone());
        }
        by_path.insert(path, content);
    }

    ordered_paths
        .into_iter()
        .map(|path| {
            let content = by_path.remove(&path).expect("path was just inserted");
            Artifact { path, content }
        })
        .collect()
}
