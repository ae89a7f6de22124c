use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::backends::BackendSelection;

#[derive(Parser, Debug)]
#[command(name = "translite")]
#[command(version)]
#[command(about = "Cached, multi-backend text translation", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (fallback hops, cache hits)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate text; pass "-" to read it from stdin
    Translate {
        text: String,

        /// Source language code, or "auto"
        #[arg(short, long)]
        from: Option<String>,

        /// Target language code
        #[arg(short, long)]
        to: Option<String>,

        /// Backend to try first
        #[arg(short, long, value_enum)]
        backend: Option<BackendArg>,

        /// List candidate translations instead of one result
        #[arg(long)]
        options: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Inspect or manage the translation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Show the offline lexicon's language pairs
    Lexicon,
    /// Initialize configuration
    Init,
    /// Show configuration and backend status
    Status,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache statistics
    Stats,
    /// Remove every cached translation
    Clear,
    /// Change the cache budget and save it to the config file
    SetSize {
        /// New budget in megabytes
        megabytes: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BackendArg {
    Auto,
    Remote,
    OnDevice,
}

impl From<BackendArg> for BackendSelection {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendSelection::Auto,
            BackendArg::Remote => BackendSelection::Remote,
            BackendArg::OnDevice => BackendSelection::OnDevice,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}
