//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solidafy incremental cursor CLI
#[derive(Parser, Debug)]
#[command(name = "solidafy-cursor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Cursor configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Stream name, overrides the name in the config
    #[arg(long, global = true)]
    pub stream: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the slices the next sync would read
    Slices,

    /// Print the normalized checkpoint of the stream
    State {
        /// Persist the normalized checkpoint to the state file
        #[arg(long)]
        write: bool,
    },

    /// Validate the cursor configuration and prior state
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
