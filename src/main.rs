use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use translite::{
    app::{load_config, load_config_from, Config},
    cli::{handle_command, Cli},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => match load_config() {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{} Failed to load config: {:#}. Using defaults.", "Warning:".yellow(), e);
                Config::default()
            }
        },
    };

    handle_command(&cli.command, &config).await
}
