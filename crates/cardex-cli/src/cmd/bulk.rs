//! `cardex bulk` - show the bulk export catalog

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let client = super::client(config)?;
    let catalog = client.bulk_catalog()?;

    let mut table = super::table(&["Type", "Size", "Updated", "Age", "Download"]);
    let now = Utc::now();
    for meta in &catalog {
        let age = now.signed_duration_since(meta.updated_at);
        table.add_row(vec![
            meta.kind.clone(),
            format_size(meta.size),
            meta.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            format!("{}h", age.num_hours()),
            meta.download_uri.clone(),
        ]);
    }
    eprintln!("\n{table}");
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
