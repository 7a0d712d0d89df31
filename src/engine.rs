//! Stage Engine: the outer control loop. Iterates ordered prompts, drives
//! assembly -> LLM -> parse -> write -> test, and implements the iteration
//! retry on test failure with feedback injection.

use crate::config::Config;
use crate::context::build_prompt;
use crate::error::{Result, VibecError};
use crate::model::{Prompt, TestResult};
use crate::plugins::{run_dynamic_plugins, PluginContext};
use crate::prompt_store::{list_plugins, list_prompts};
use crate::{llm, parser, test_harness, workspace};
use std::collections::HashMap;
use tracing::{info, warn};

/// Run one stage-engine pass over `[cfg.start, cfg.end]` (the whole ordered
/// prompt sequence if neither bound is set).
pub fn run(cfg: &Config) -> Result<()> {
    workspace::initialize(&cfg.output)?;

    if let Some(start) = cfg.start {
        if start > 1 {
            workspace::reconstruct(&cfg.output, &cfg.stacks, start)?;
        }
    }

    let mut prompts = list_prompts(&cfg.workdir, &cfg.stacks)?;
    prompts.retain(|p| {
        cfg.start.map(|s| p.number >= s).unwrap_or(true) && cfg.end.map(|e| p.number <= e).unwrap_or(true)
    });

    let mut static_plugin_cache: HashMap<String, Vec<String>> = HashMap::new();
    let mut dynamic_plugin_cache: HashMap<String, Vec<crate::model::Plugin>> = HashMap::new();

    for prompt in &prompts {
        if !static_plugin_cache.contains_key(&prompt.stack) {
            let (statics, dynamics) = list_plugins(&cfg.workdir, &prompt.stack)?;
            let static_texts = statics
                .iter()
                .filter_map(|p| std::fs::read_to_string(&p.path).ok())
                .collect();
            static_plugin_cache.insert(prompt.stack.clone(), static_texts);
            dynamic_plugin_cache.insert(prompt.stack.clone(), dynamics);
        }

        run_prompt(
            cfg,
            prompt,
            &static_plugin_cache[&prompt.stack],
            &dynamic_plugin_cache[&prompt.stack],
        )?;
    }

    Ok(())
}

fn run_prompt(
    cfg: &Config,
    prompt: &Prompt,
    static_plugins: &[String],
    dynamic_plugins: &[crate::model::Plugin],
) -> Result<()> {
    let workspace_dir = cfg.output.join("current");
    let mut test_feedback: Option<TestResult> = None;

    for attempt in 0..cfg.iterations {
        let assembled = build_prompt(prompt, &workspace_dir, static_plugins, test_feedback.as_ref());

        let ctx = PluginContext::new(
            cfg,
            &prompt.stack,
            prompt.number,
            &assembled,
            &workspace_dir.to_string_lossy(),
            test_feedback.as_ref(),
        );
        if let Ok(ctx_json) = serde_json::to_string(&ctx) {
            run_dynamic_plugins(dynamic_plugins, &ctx_json, &cfg.plugin_runner, cfg.plugin_timeout);
        }

        let completion = llm::complete(&assembled, cfg)?;
        let artifacts = parser::parse(&completion);
        if artifacts.is_empty() && !completion.trim().is_empty() {
            warn!(stage = prompt.number, error = %VibecError::ParseEmpty, "degraded completion, proceeding to tests");
        }

        let produced: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        for declared in &prompt.outputs {
            if !produced.contains(&declared.as_str()) {
                warn!(stage = prompt.number, output = %declared, "declared output missing from completion");
            }
        }

        if !cfg.dry_run {
            workspace::write(&artifacts, &prompt.stack, &prompt.basename, &cfg.output)?;
        }

        let Some(test_cmd) = cfg.test_cmd.as_deref() else {
            info!(stage = prompt.number, "no test command configured, stage done");
            return Ok(());
        };

        let outcome = test_harness::run(Some(test_cmd));
        if outcome.success {
            info!(stage = prompt.number, attempt, "stage tests passed");
            return Ok(());
        }

        if attempt + 1 >= cfg.iterations {
            return Err(VibecError::TestFailure {
                iterations: cfg.iterations,
            });
        }

        warn!(stage = prompt.number, attempt, "stage tests failed, retrying with feedback");
        test_feedback = Some(TestResult {
            success: false,
            output: outcome.output,
        });
    }

    Err(VibecError::TestFailure {
        iterations: cfg.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base_config(tmp: &TempDir) -> Config {
        Config {
            workdir: tmp.path().to_path_buf(),
            stacks: vec!["core".to_string()],
            dry_run: true,
            start: None,
            end: None,
            api_url: "https://example.invalid".to_string(),
            api_key: None,
            api_model: "model".to_string(),
            test_cmd: None,
            retries: 0,
            iterations: 2,
            plugin_timeout: 1000,
            output: tmp.path().join("output"),
            plugin_runner: "node".to_string(),
            bootstrap: false,
        }
    }

    #[test]
    fn minimal_dry_run_writes_no_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("stacks/core")).unwrap();
        fs::write(
            tmp.path().join("stacks/core/001_test.md"),
            "# T\n## Output: a.js\n",
        )
        .unwrap();

        let cfg = base_config(&tmp);
        run(&cfg).unwrap();

        assert!(!tmp.path().join("output/current/a.js").exists());
        assert!(!tmp.path().join("output/stacks").exists());
    }
}
