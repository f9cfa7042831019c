//! CLI argument definitions using clap

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// chainpulse - step through API chains, dry-run single steps and pick
/// extraction rules out of responses
#[derive(Parser, Debug, Clone)]
#[command(name = "chainpulse", version, about, long_about = None)]
pub struct Args {
    // =========================================================================
    // GLOBAL OPTIONS
    // =========================================================================

    /// Config file (defaults to <config dir>/chainpulse/config.toml)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Backend root URL, e.g. http://localhost:5000
    #[arg(long = "base-url", value_name = "URL", env = "CHAINPULSE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout (e.g. 30s, 2m). No timeout unless set
    #[arg(long = "timeout", value_name = "DURATION", global = true)]
    pub timeout: Option<String>,

    /// Verbose diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Diagnostic log format
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormat,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Execute a chain one step at a time
    Debug(DebugArgs),

    /// Dry-run a single step against a mock context
    #[command(name = "test-step")]
    TestStep(TestStepArgs),

    /// Pick values out of a saved response and turn them into extraction rules
    Pick(PickArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DebugArgs {
    /// Chain file (YAML or TOML)
    #[arg(long = "chain", value_name = "FILE", conflicts_with = "steps", required_unless_present = "steps")]
    pub chain: Option<PathBuf>,

    /// Step id, in execution order (repeatable)
    #[arg(long = "step", value_name = "ID")]
    pub steps: Vec<String>,

    /// Run every step without prompting, stopping at the first failure
    #[arg(long = "all", action = ArgAction::SetTrue)]
    pub all: bool,

    /// Print session summaries as JSON lines
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TestStepArgs {
    /// Endpoint the step calls
    #[arg(long = "endpoint-id", value_name = "ID")]
    pub endpoint_id: String,

    /// Payload template; @FILE reads it from a file
    #[arg(long = "payload", value_name = "TEXT", default_value = "")]
    pub payload: String,

    /// Headers template; @FILE reads it from a file
    #[arg(long = "headers", value_name = "TEXT", default_value = "")]
    pub headers: String,

    /// Data extraction rules as a JSON array; @FILE reads it from a file
    #[arg(long = "rules", value_name = "JSON", default_value = "")]
    pub rules: String,

    /// Mock context as a JSON object; @FILE reads it from a file
    #[arg(long = "mock-context", value_name = "JSON", default_value = "")]
    pub mock_context: String,

    /// Open the response in the picker afterwards
    #[arg(long = "pick", action = ArgAction::SetTrue)]
    pub pick: bool,

    /// File that committed rules are merged into (printed when absent)
    #[arg(long = "rules-out", value_name = "FILE")]
    pub rules_out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PickArgs {
    /// Saved response body; `-` or nothing reads stdin
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Select this path without prompting (repeatable)
    #[arg(long = "select", value_name = "PATH")]
    pub select: Vec<String>,

    /// File that committed rules are merged into (printed when absent)
    #[arg(long = "rules-out", value_name = "FILE")]
    pub rules_out: Option<PathBuf>,
}

/// Log format for diagnostics
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines (default)
    #[default]
    Pretty,
    /// JSON Lines format for parsing
    Json,
}
