//! Configuration loading and merging.
//!
//! Precedence, highest first: CLI flags, environment variables
//! (`VIBEC_<UPPER_SNAKE>`), `<workdir>/vibec.json`, then the defaults below.
//! The result is an immutable snapshot passed by reference into every
//! component for the duration of one engine invocation.

use crate::cli::RootArgs;
use crate::error::{Result, VibecError};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub workdir: PathBuf,
    pub stacks: Vec<String>,
    pub dry_run: bool,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub api_url: String,
    pub api_key: Option<String>,
    pub api_model: String,
    pub test_cmd: Option<String>,
    pub retries: u32,
    pub iterations: u32,
    pub plugin_timeout: u64,
    pub output: PathBuf,
    pub plugin_runner: String,
    pub bootstrap: bool,
}

/// Mirrors `vibec.json`'s recognized keys; every field optional so a
/// partial file only overrides what it names.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    workdir: Option<String>,
    stacks: Option<Vec<String>>,
    dry_run: Option<bool>,
    start: Option<u64>,
    end: Option<u64>,
    api_url: Option<String>,
    api_key: Option<String>,
    api_model: Option<String>,
    test_cmd: Option<String>,
    retries: Option<u32>,
    iterations: Option<u32>,
    plugin_timeout: Option<u64>,
    output: Option<String>,
    plugin_runner: Option<String>,
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("VIBEC_{key}")).ok()
}

fn env_bool(key: &str) -> Result<Option<bool>> {
    match env_var(key) {
        None => Ok(None),
        Some(v) => match v.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(VibecError::InvalidConfig {
                key: key.to_lowercase(),
                message: format!("expected true/false, got {other:?}"),
            }),
        },
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match env_var(key) {
        None => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| VibecError::InvalidConfig {
            key: key.to_lowercase(),
            message: format!("expected an integer, got {v:?}"),
        }),
    }
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    Ok(env_u64(key)?.map(|v| v as u32))
}

/// Load `<workdir>/vibec.json` if present. Malformed JSON is fatal;
/// absence is silently ignored.
fn load_file_config(workdir: &std::path::Path) -> Result<FileConfig> {
    let path = workdir.join("vibec.json");
    match std::fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text).map_err(|e| VibecError::InvalidConfig {
            key: "vibec.json".to_string(),
            message: e.to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
        Err(e) => Err(VibecError::InvalidConfig {
            key: "vibec.json".to_string(),
            message: e.to_string(),
        }),
    }
}

/// Merge CLI args, environment, the config file, and defaults into one
/// validated `Config`.
pub fn load(args: &RootArgs) -> Result<Config> {
    // workdir must be resolved first since the config file lives under it.
    let workdir = args
        .workdir
        .clone()
        .or_else(|| env_var("WORKDIR").map(PathBuf::from))
        .unwrap_or_else(default_workdir);

    let file = load_file_config(&workdir)?;

    let stacks = args
        .stacks
        .clone()
        .or_else(|| env_var("STACKS").map(|s| s.split(',').map(|p| p.trim().to_string()).collect()))
        .or(file.stacks)
        .unwrap_or_else(|| vec!["core".to_string()]);

    let dry_run = args
        .dry_run
        .then_some(true)
        .or(env_bool("DRY_RUN")?)
        .or(file.dry_run)
        .unwrap_or(false);

    let start = args.start.or(env_u64("START")?).or(file.start);
    let end = args.end.or(env_u64("END")?).or(file.end);

    let api_url = args
        .api_url
        .clone()
        .or_else(|| env_var("API_URL"))
        .or(file.api_url)
        .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string());

    let api_key = args.api_key.clone().or_else(|| env_var("API_KEY")).or(file.api_key);

    let api_model = args
        .api_model
        .clone()
        .or_else(|| env_var("API_MODEL"))
        .or(file.api_model)
        .unwrap_or_else(|| "anthropic/claude-3.7-sonnet".to_string());

    let test_cmd = args.test_cmd.clone().or_else(|| env_var("TEST_CMD")).or(file.test_cmd);

    let retries = args
        .retries
        .or(env_u32("RETRIES")?)
        .or(file.retries)
        .unwrap_or(0);

    let iterations = args
        .iterations
        .or(env_u32("ITERATIONS")?)
        .or(file.iterations)
        .unwrap_or(2);

    let plugin_timeout = args
        .plugin_timeout
        .or(env_u64("PLUGIN_TIMEOUT")?)
        .or(file.plugin_timeout)
        .unwrap_or(5000);

    let output = args
        .output
        .clone()
        .or_else(|| env_var("OUTPUT").map(PathBuf::from))
        .or(file.output.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("output"));
    // `output` is documented as rooted under `workdir` the same as `stacks/`
    // and `vibec.json`; an absolute override still wins outright.
    let output = if output.is_absolute() {
        output
    } else {
        workdir.join(output)
    };

    let plugin_runner = args
        .plugin_runner
        .clone()
        .or_else(|| env_var("PLUGIN_RUNNER"))
        .or(file.plugin_runner)
        .unwrap_or_else(|| "node".to_string());

    let bootstrap = args.bootstrap;

    if iterations < 1 {
        return Err(VibecError::InvalidConfig {
            key: "iterations".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
    if plugin_timeout == 0 {
        return Err(VibecError::InvalidConfig {
            key: "pluginTimeout".to_string(),
            message: "must be > 0".to_string(),
        });
    }

    Ok(Config {
        workdir,
        stacks,
        dry_run,
        start,
        end,
        api_url,
        api_key,
        api_model,
        test_cmd,
        retries,
        iterations,
        plugin_timeout,
        output,
        plugin_runner,
        bootstrap,
    })
}
