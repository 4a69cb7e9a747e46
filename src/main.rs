// src/main.rs
mod access;
mod cli;
mod client;
mod commands;
mod config;
mod credits;
mod error;
mod gemini;
mod library;
mod optimizer;
mod prompts;
mod types;


use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use client::LlmClient;
use commands::*;
use config::{Config, ResolvedConfig};

// =============================================================================
// LOGGING
// =============================================================================
fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_module("promptify", log::LevelFilter::Debug);
    }
    builder
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

// =============================================================================
// MAIN
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let file_config = Config::load();

    match &cli.command {
        Commands::Init { admins, target } => return cmd_init(&cli, &file_config, admins, *target),
        Commands::Config => return cmd_config(&cli, &file_config),
        _ => {}
    }

    let config = ResolvedConfig::new(&cli, &file_config);
    log::debug!("data dir: {}", config.data_dir.display());

    match cli.command {
        Commands::Optimize { idea, file, target, image, no_save, json } => {
            let client = LlmClient::new(&config)?;
            cmd_optimize(&config, &client, idea, file, target, image, !no_save, json).await?
        }
        Commands::Credits { watch } => cmd_credits(&config, watch).await?,
        Commands::Prompts { command } => cmd_prompts(&config, command)?,
        Commands::Models => {
            let client = LlmClient::new(&config)?;
            cmd_models(&client).await?
        }
        Commands::Init { .. } | Commands::Config => unreachable!(),
    }

    Ok(())
}
