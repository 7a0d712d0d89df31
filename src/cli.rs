//! Command-line surface.
//!
//! Mirrors the configuration-key table: every flag is optional here so
//! `config::load` can apply the CLI > environment > file > defaults
//! precedence uniformly. Absence of a flag means "fall through," not
//! "use clap's own default."
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "vibec",
    version,
    about = "Prompt-driven, self-bootstrapping code generator",
    after_help = "Examples:\n  vibec --stacks=core --dryRun\n  vibec --bootstrap --stacks=core,extra --testCmd='npm test'\n  vibec --start=3 --end=3"
)]
pub struct RootArgs {
    /// Root for stacks/, vibec.json, output/
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Ordered, comma-separated list of stacks to process
    #[arg(long, value_name = "A,B", value_delimiter = ',')]
    pub stacks: Option<Vec<String>>,

    /// Skip HTTP and file writes; use the dry-run fixture response
    #[arg(long = "dryRun")]
    pub dry_run: bool,

    /// First stage number to process (inclusive)
    #[arg(long)]
    pub start: Option<u64>,

    /// Last stage number to process (inclusive)
    #[arg(long)]
    pub end: Option<u64>,

    /// Chat-completion base URL
    #[arg(long = "apiUrl", value_name = "URL")]
    pub api_url: Option<String>,

    /// Bearer credential for the LLM endpoint
    #[arg(long = "apiKey", value_name = "KEY")]
    pub api_key: Option<String>,

    /// Model identifier
    #[arg(long = "apiModel", value_name = "MODEL")]
    pub api_model: Option<String>,

    /// Shell command to gate iteration
    #[arg(long = "testCmd", value_name = "CMD")]
    pub test_cmd: Option<String>,

    /// LLM retry attempts beyond the first (>= 0)
    #[arg(long)]
    pub retries: Option<u32>,

    /// Max attempts per prompt on test failure (>= 1)
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Dynamic-plugin timeout in ms (> 0)
    #[arg(long = "pluginTimeout")]
    pub plugin_timeout: Option<u64>,

    /// Output root directory
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Executable used to invoke dynamic plugins
    #[arg(long = "pluginRunner", value_name = "EXE")]
    pub plugin_runner: Option<String>,

    /// Run the bootstrap driver instead of a single stage-engine pass
    #[arg(long)]
    pub bootstrap: bool,
}
