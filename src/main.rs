//! Entry point: init logging, parse CLI, load configuration, dispatch to
//! either the Bootstrap Driver or a single Stage Engine pass.

mod bootstrap;
mod cli;
mod config;
mod context;
mod engine;
mod error;
mod llm;
mod logging;
mod model;
mod parser;
mod plugins;
mod prompt_store;
mod test_harness;
mod workspace;

use clap::Parser;
use error::VibecError;

fn main() {
    logging::init();

    let args = cli::RootArgs::parse();
    let cfg = match config::load(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let result = if cfg.bootstrap {
        bootstrap::run(&cfg)
    } else {
        engine::run(&cfg)
    };

    if let Err(e) = result {
        let code = exit_code_for(&e);
        // Route through anyhow here, and only here, so the logged message
        // carries the full `source` chain rather than just the top variant.
        let chain = format!("{:?}", anyhow::Error::new(e));
        tracing::error!(error = %chain, "engine invocation failed");
        std::process::exit(code);
    }
}

fn exit_code_for(err: &VibecError) -> i32 {
    match err {
        VibecError::InvalidConfig { .. } => 2,
        VibecError::LLMAuth { .. } => 3,
        VibecError::TestFailure { .. } => 4,
        _ => 1,
    }
}
