use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use crate::{
    app::{get_config_dir, init_config, save_config, Config},
    backends::{BackendKind, LocalLexicon, TranslationOption},
    cache::CacheStore,
    constants::BYTES_PER_MB,
    runtime::Coordinator,
};

use super::{CacheAction, Commands, OutputFormat};

/// Handle CLI subcommands
pub async fn handle_command(command: &Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Translate {
            text,
            from,
            to,
            backend,
            options,
            output,
        } => {
            let text = read_text(text)?;
            let source = from.as_deref().unwrap_or(&config.translation.default_source);
            let target = to.as_deref().unwrap_or(&config.translation.default_target);

            let coordinator = Coordinator::from_config(config, None)?;
            if let Some(backend) = backend {
                coordinator.set_selection((*backend).into());
            }

            if *options {
                let candidates = coordinator.translate_with_options(&text, source, target).await?;
                println!("{}", render_options(&candidates, *output));
            } else {
                let translation = coordinator.translate(&text, source, target).await?;
                println!(
                    "{}",
                    render_translation(
                        &translation,
                        source,
                        target,
                        coordinator.active_backend(),
                        *output
                    )
                );
            }
            Ok(())
        }
        Commands::Cache { action } => handle_cache(action, config),
        Commands::Lexicon => show_lexicon(config),
        Commands::Init => {
            println!("Initializing translite configuration...");
            let path = init_config()?;
            println!("Configuration written to {}", path.display().to_string().cyan());
            Ok(())
        }
        Commands::Status => show_status(config),
    }
}

fn read_text(text: &str) -> Result<String> {
    if text == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read text from stdin")
    } else {
        Ok(text.to_string())
    }
}

#[derive(Serialize)]
struct TranslationOutput<'a> {
    translation: &'a str,
    source: &'a str,
    target: &'a str,
    /// Where the call started; fallbacks may have produced the text
    selected_backend: BackendKind,
}

/// Format a single translation for printing
pub fn render_translation(
    translation: &str,
    source: &str,
    target: &str,
    selected_backend: BackendKind,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => translation.to_string(),
        OutputFormat::Json => {
            let output = TranslationOutput {
                translation,
                source,
                target,
                selected_backend,
            };
            serde_json::to_string_pretty(&output).unwrap_or_else(|e| {
                format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)
            })
        }
    }
}

/// Format ranked candidates for printing
pub fn render_options(options: &[TranslationOption], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(options).unwrap_or_else(|e| {
            format!("{{\"error\": \"Failed to serialize options: {}\"}}", e)
        }),
        OutputFormat::Text => options
            .iter()
            .enumerate()
            .map(|(index, option)| {
                let mut line = format!(
                    "{:>2}. {}  ({:?}, {:.0}%)",
                    index + 1,
                    option.text,
                    option.category,
                    option.confidence * 100.0
                );
                if let Some(pos) = &option.part_of_speech {
                    line.push_str(&format!("  [{}]", pos));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn handle_cache(action: &CacheAction, config: &Config) -> Result<()> {
    let store = CacheStore::from_config(&config.cache)?;
    match action {
        CacheAction::Stats => {
            println!("{}", "Translation cache".bold());
            println!("{}", store.statistics().format());
        }
        CacheAction::Clear => {
            let removed = store.len();
            store.clear();
            println!("Removed {} cached translations", removed.to_string().green());
        }
        CacheAction::SetSize { megabytes } => {
            store.set_max_size_bytes(megabytes.saturating_mul(BYTES_PER_MB));

            let mut updated = config.clone();
            updated.cache.max_size_mb = *megabytes;
            save_config(&updated, None)?;

            println!(
                "Cache budget set to {} MB ({} entries kept)",
                megabytes.to_string().green(),
                store.len()
            );
        }
    }
    Ok(())
}

fn show_lexicon(config: &Config) -> Result<()> {
    let lexicon = LocalLexicon::from_config(&config.lexicon)?;
    println!("{}", "Offline lexicon".bold());
    for pair in lexicon.supported_pairs() {
        println!("  • {}  {} phrases", pair.to_string().green(), lexicon.table_size(&pair));
    }
    println!("  {} phrases in total", lexicon.dictionary_size());
    Ok(())
}

/// Show configuration and backend status
fn show_status(config: &Config) -> Result<()> {
    println!("translite v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config_path = get_config_dir()?.join("config.toml");
    if config_path.exists() {
        println!("  {} Configuration: {}", "[OK]".green(), config_path.display());
    } else {
        println!("  {} Configuration: Not found (using defaults)", "[WARNING]".yellow());
    }

    println!("  Backend selection: {:?}", config.translation.backend);
    println!("  {} Remote dictionary: {}", "[OK]".green(), config.remote.base_url);
    println!(
        "  {} On-device engine: Not available on this host",
        "[WARNING]".yellow()
    );

    match LocalLexicon::from_config(&config.lexicon) {
        Ok(lexicon) => println!(
            "  {} Offline lexicon: {} pairs, {} phrases",
            "[OK]".green(),
            lexicon.supported_pairs().len(),
            lexicon.dictionary_size()
        ),
        Err(e) => println!("  {} Offline lexicon: {:#}", "[ERROR]".red(), e),
    }

    if config.cache.persist {
        let directory = config.cache.resolve_directory()?;
        println!("  Cache directory: {}", directory.display());
    } else {
        println!("  Cache: in memory only");
    }
    println!("  Cache budget: {} MB", config.cache.max_size_mb);

    println!();
    Ok(())
}
