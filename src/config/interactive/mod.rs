
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, RetrievalConfig, ServiceConfig};
use crate::chunking::ChunkingConfig;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 Docs QA Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Service Configuration").bold().yellow());
    eprintln!("Configure the OpenAI-compatible embedding and generation API.");
    eprintln!();

    configure_service(&mut config.service)?;

    eprintln!();
    eprintln!("{}", style("Chunking & Retrieval").bold().yellow());
    configure_chunking(&mut config.chunking)?;
    configure_retrieval(&mut config.retrieval)?;

    eprintln!();
    if let Err(e) = config.validate() {
        eprintln!("{} {}", style("✗ Invalid configuration:").red(), e);
        return Ok(());
    }

    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.base_dir.join("config.toml").display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Service Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.service.base_url).cyan());
    eprintln!("  API key env: {}", style(&config.service.api_key_env).cyan());
    eprintln!(
        "  Embedding model: {}",
        style(&config.service.embedding_model).cyan()
    );
    eprintln!(
        "  Generation model: {}",
        style(&config.service.generation_model).cyan()
    );
    eprintln!(
        "  Timeout: {}s",
        style(config.service.timeout_seconds).cyan()
    );
    eprintln!(
        "  Max prompt tokens: {}",
        style(config.service.max_prompt_tokens).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Chunking Settings:").bold().yellow());
    eprintln!("  Chunk size: {}", style(config.chunking.chunk_size).cyan());
    eprintln!(
        "  Chunk overlap: {}",
        style(config.chunking.chunk_overlap).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!("{}", style("Storage:").bold().yellow());
    eprintln!(
        "  Documents: {}",
        style(config.documents_path().display()).cyan()
    );
    eprintln!("  Index: {}", style(config.index_path().display()).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.base_dir.join("config.toml").display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load_default().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let mut config = Config::default();
            config.base_dir = Config::config_dir()?;
            Ok(config)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_service(service: &mut ServiceConfig) -> Result<()> {
    service.base_url = Input::new()
        .with_prompt("Service base URL")
        .default(service.base_url.clone())
        .validate_with(|input: &String| -> Result<(), String> {
            url::Url::parse(input)
                .map(|_| ())
                .map_err(|_| format!("Invalid URL: {input}"))
        })
        .interact_text()?;

    service.api_key_env = Input::new()
        .with_prompt("API key environment variable")
        .default(service.api_key_env.clone())
        .interact_text()?;

    service.embedding_model = Input::new()
        .with_prompt("Embedding model")
        .default(service.embedding_model.clone())
        .interact_text()?;

    service.generation_model = Input::new()
        .with_prompt("Generation model")
        .default(service.generation_model.clone())
        .interact_text()?;

    service.timeout_seconds = Input::new()
        .with_prompt("Request timeout (seconds)")
        .default(service.timeout_seconds)
        .interact_text()?;

    Ok(())
}

fn configure_chunking(chunking: &mut ChunkingConfig) -> Result<()> {
    chunking.chunk_size = Input::new()
        .with_prompt("Chunk size (characters)")
        .default(chunking.chunk_size)
        .interact_text()?;

    chunking.chunk_overlap = Input::new()
        .with_prompt("Chunk overlap (characters)")
        .default(chunking.chunk_overlap)
        .validate_with({
            let chunk_size = chunking.chunk_size;
            move |input: &usize| -> Result<(), String> {
                if *input < chunk_size {
                    Ok(())
                } else {
                    Err(format!(
                        "Overlap must be smaller than chunk size ({chunk_size})"
                    ))
                }
            }
        })
        .interact_text()?;

    Ok(())
}

fn configure_retrieval(retrieval: &mut RetrievalConfig) -> Result<()> {
    retrieval.top_k = Input::new()
        .with_prompt("Chunks retrieved per question (top K)")
        .default(retrieval.top_k)
        .interact_text()?;

    Ok(())
}
