pub mod bulk;
pub mod ingest;
pub mod sets;

use std::sync::Arc;

use anyhow::{Context, Result};
use cardex_core::{HttpTransport, RateLimiter};
use cardex_scryfall::ScryfallClient;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::config::Config;

/// API client over HTTP with the configured spacing.
pub fn client(config: &Config) -> Result<ScryfallClient> {
    let transport =
        HttpTransport::new(config.api.http_config()).context("Failed to build HTTP client")?;
    let limiter = RateLimiter::new(config.api.min_interval());
    Ok(ScryfallClient::new(
        Arc::new(transport),
        Arc::new(limiter),
        config.api.base_url.as_str(),
    ))
}

/// Table with the house style
pub fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

pub fn print_config(config: &Config) {
    let mut table = table(&["Setting", "Value"]);
    let mut row = |key: &str, value: String| {
        table.add_row(vec![key.to_string(), value]);
    };
    let list = |items: &[String]| {
        if items.is_empty() {
            "-".to_string()
        } else {
            items.join(", ")
        }
    };
    let ingest = &config.ingest;

    row("API base URL", config.api.base_url.clone());
    row("User agent", config.api.user_agent.clone());
    row("Min interval", format!("{}ms", config.api.min_interval_ms));
    row("Read timeout", format!("{}s", config.api.read_timeout));
    row("Connect timeout", format!("{}s", config.api.connect_timeout));
    row("Max retries", config.api.max_retries.to_string());
    row("Rulings", ingest.process_rulings.to_string());
    row("Card export", ingest.card_bulk_type.clone());
    row(
        "Max sets",
        ingest
            .max_sets
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string()),
    );
    row("Set codes", list(&ingest.set_codes));
    row("Denied codes", list(&ingest.denied_set_codes));
    row("Denied types", list(&ingest.denied_set_types));
    row("Digital sets", ingest.include_digital.to_string());
    row("Previews", ingest.include_previews.to_string());
    row("Strict paging", ingest.strict_paging.to_string());
    row("Store root", config.store.root.display().to_string());
    row("Writers", config.workers.writers.to_string());
    row("Batch size", config.workers.batch_size.to_string());

    eprintln!("\n{table}");
}
