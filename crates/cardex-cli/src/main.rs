//! cardex - bulk ingestion of the card catalog
//!
//! Pulls sets, cards and rulings from the catalog API, builds the artist,
//! ruling and trigram indices and writes them to the document store.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "cardex")]
#[command(about = "Bulk ingestion and indexing for the card catalog")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./cardex.toml or ~/.config/cardex/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Read timeout in seconds for stall detection
    #[arg(long, global = true)]
    read_timeout: Option<u64>,

    /// Maximum retry attempts for transient failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full ingestion pipeline
    Ingest(cmd::ingest::IngestArgs),
    /// List the bulk exports the API offers
    Bulk,
    /// List sets and whether the configured filters keep them
    Sets(cmd::sets::SetsArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(cardex_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, progress bars show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    cardex_core::init_logging(quiet, cli.debug, multi);

    let mut config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    // CLI overrides config file
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(read_timeout) = cli.read_timeout {
        config.api.read_timeout = read_timeout;
    }
    if let Some(max_retries) = cli.max_retries {
        config.api.max_retries = max_retries;
    }

    match cli.command {
        Command::Ingest(args) => cmd::ingest::run(args, &config, &progress),
        Command::Bulk => cmd::bulk::run(&config),
        Command::Sets(args) => cmd::sets::run(args, &config),
        Command::Config => {
            cmd::print_config(&config);
            Ok(())
        }
    }
}
