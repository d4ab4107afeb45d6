use cardex_core::{PagingOutcome, fmt_num};
use cardex_scryfall::{FilterChain, ScryfallClient};
use cardex_store::DocumentBuffer;
use indicatif::ProgressBar;

use super::LoadStats;
use crate::catalog::SetCatalog;
use crate::documents::{SetAssociation, set_association_document, set_document};

/// Result of the set listing pass.
#[derive(Debug, Clone, Default)]
pub struct SetLoad {
    pub stats: LoadStats,
    pub paging: PagingOutcome,
}

/// Enumerate every set, keep those the chain accepts and buffer their
/// documents. Included sets are registered in `catalog`.
///
/// A truncated listing is logged and reported in [`SetLoad::paging`]; with
/// `strict` it is an error.
pub fn load_sets(
    client: &ScryfallClient,
    chain: &mut FilterChain,
    catalog: &mut SetCatalog,
    buffer: &mut DocumentBuffer<'_>,
    strict: bool,
    pb: &ProgressBar,
) -> anyhow::Result<SetLoad> {
    let mut stats = LoadStats::default();
    let mut pages = client.sets();

    for set in pages.by_ref() {
        stats.elements += 1;
        stats.parsed += 1;
        if !chain.should_include(&set) {
            stats.skipped += 1;
            continue;
        }

        buffer.push(set_document(&set)?);
        stats.documents += 1;
        if let Some(assoc) = SetAssociation::of(&set) {
            buffer.push(set_association_document(&assoc)?);
            stats.documents += 1;
        }
        catalog.insert(&set);
        pb.set_message(format!("{} sets kept", fmt_num(catalog.len())));
    }

    let paging = pages.outcome().clone();
    if let Some(reason) = &paging.truncated {
        if strict {
            anyhow::bail!(
                "set listing truncated after {} pages: {reason}",
                paging.pages
            );
        }
        log::warn!(
            "Set listing incomplete after {} pages ({reason}); continuing with {} sets",
            paging.pages,
            catalog.len()
        );
    }

    log::info!(
        "Sets: {} listed, {} kept, {} filtered",
        fmt_num(stats.elements),
        fmt_num(catalog.len()),
        fmt_num(stats.skipped)
    );
    Ok(SetLoad { stats, paging })
}
