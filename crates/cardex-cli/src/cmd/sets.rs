//! `cardex sets` - preview which sets an ingest would keep

use anyhow::Result;
use cardex_core::fmt_num;
use clap::Args;
use comfy_table::{Cell, Color};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct SetsArgs {
    /// Also list sets the filters reject
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: SetsArgs, config: &Config) -> Result<()> {
    let ingest = config.ingest_config()?;
    let client = super::client(config)?;
    let mut chain = ingest.filter_chain(chrono::Local::now().date_naive());

    let mut table = super::table(&["Code", "Name", "Type", "Released", "Parent", "Cards", "Kept"]);
    let mut kept = 0usize;
    let mut sets = client.sets();
    for set in sets.by_ref() {
        let include = chain.should_include(&set);
        if include {
            kept += 1;
        } else if !args.all {
            continue;
        }
        table.add_row(vec![
            Cell::new(&set.code),
            Cell::new(&set.name),
            Cell::new(&set.set_type),
            Cell::new(set.released_at.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(set.parent_code().unwrap_or("")),
            Cell::new(set.card_count),
            if include {
                Cell::new("yes").fg(Color::Green)
            } else {
                Cell::new("no").fg(Color::DarkGrey)
            },
        ]);
    }
    eprintln!("\n{table}");

    let outcome = sets.outcome();
    eprintln!(
        "{} sets kept, {} rejected ({} pages)",
        fmt_num(kept),
        fmt_num(chain.rejected()),
        outcome.pages
    );
    if let Some(reason) = &outcome.truncated {
        anyhow::ensure!(!ingest.strict_paging, "set listing truncated: {reason}");
        log::warn!("Set listing incomplete: {reason}");
    }
    Ok(())
}
