//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Joinlab - validate tutorial SQL join examples against fixture data
#[derive(Parser, Debug)]
#[command(name = "jl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override target database path (`:memory:` or a DuckDB file)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load fixtures and validate every catalog entry
    Check(CheckArgs),

    /// List catalog entries
    Ls(LsArgs),

    /// Load fixtures into the target database and check invariants
    Seed(SeedArgs),

    /// Parse catalog queries without executing them
    Validate(ValidateArgs),
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Catalog markdown file (overrides config)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Directory of fixture CSV files (overrides config)
    #[arg(long)]
    pub fixtures: Option<String>,

    /// Entry ids to check (comma-separated, default: all)
    #[arg(short, long)]
    pub entries: Option<String>,

    /// Stop on first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: CheckOutput,

    /// Show per-entry durations
    #[arg(long)]
    pub timings: bool,
}

/// Check output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutput {
    /// Human-readable report
    Text,
    /// JSON output
    Json,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Catalog markdown file (overrides config)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LsOutput,
}

/// List output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the seed command
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Directory of fixture CSV files (overrides config)
    #[arg(long)]
    pub fixtures: Option<String>,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Catalog markdown file (overrides config)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
