mod cli;
mod collector;
mod config;
mod dataset;
mod error;
mod github;
mod parser;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use collector::Collector;
use dataset::DatasetWriter;
use github::{GitHubClient, ReqwestTransport};
use parser::code_parser::CodeParser;

/// Load .env files from multiple locations with priority order:
/// 1. Current working directory (project-specific config)
/// 2. XDG config directory ~/.config/snippet-harvester/.env (global default config)
///
/// Environment variables set directly in the shell always take highest priority.
fn load_env_files() {
    let cwd_env = std::env::current_dir().map(|p| p.join(".env")).ok();
    if let Some(path) = cwd_env {
        if path.exists() && dotenv::from_path(&path).is_ok() {
            tracing::debug!("Loaded .env from: {}", path.display());
            return;
        }
    }

    if let Some(config_dir) = get_xdg_config_dir() {
        let xdg_env = config_dir.join("snippet-harvester").join(".env");
        if xdg_env.exists() && dotenv::from_path(&xdg_env).is_ok() {
            tracing::debug!("Loaded .env from: {}", xdg_env.display());
            return;
        }
    }

    tracing::debug!("No .env file found, using environment variables only");
}

/// Get XDG config directory, fallback to ~/.config
fn get_xdg_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before argument parsing so .env values can feed the env-backed flags
    load_env_files();

    // Progress goes to stderr; override the level with RUST_LOG (e.g. RUST_LOG=debug)
    let env_filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    let cli = Cli::parse();
    let config = cli.to_config();
    let parser = CodeParser::new();
    config.validate(&parser).context("Invalid configuration")?;

    if cli.token.is_none() {
        tracing::warn!("GITHUB_TOKEN is not set, running with the unauthenticated quota");
    }

    let transport = ReqwestTransport::new(cli.token.clone());
    let client = GitHubClient::new(Box::new(transport), &config.api_url, config.quota)
        .context("Failed to set up the GitHub client")?;

    let writer = DatasetWriter::create(&config.output_dir, &config.record_prefix)
        .await
        .context("Failed to prepare the output directory")?;

    let collector = Collector::new(client, parser, writer, config)?;

    let summary = collector.run().await;

    println!("{}", "=".repeat(60));
    println!("DONE");
    println!(
        "Collected {} code blocks from {} of {} repositories into '{}'",
        summary.blocks_written,
        summary.repositories_visited,
        summary.repositories_found,
        summary.output_dir.display()
    );
    if summary.repositories_failed > 0 {
        println!("{} repositories were skipped after errors", summary.repositories_failed);
    }
    println!("{}", "=".repeat(60));

    Ok(())
}
