/// CLI argument parsing and command handling - Gateway
mod args;
mod commands;

pub use args::{BackendArg, CacheAction, Cli, Commands, OutputFormat};
pub use commands::{handle_command, render_options, render_translation};
