use anyhow::Context;
use cardex_core::{Body, for_each_element, fmt_num};
use cardex_index::{ArtistAggregator, TrigramAggregator};
use cardex_scryfall::RemoteCard;
use cardex_store::{DocumentBuffer, StoreError};
use indicatif::ProgressBar;

use super::{ByteProgress, LoadStats};
use crate::catalog::SetCatalog;
use crate::documents::set_card_document;

/// Everything a card is routed to.
pub struct CardSinks<'a, 'w> {
    pub buffer: &'a mut DocumentBuffer<'w>,
    pub card_trigrams: &'a mut TrigramAggregator,
    pub artists: &'a mut ArtistAggregator,
}

/// Stream a card export. Cards of sets in `catalog` become set-card
/// documents and feed the card trigram and artist aggregators; the rest are
/// counted as skipped.
pub fn load_cards(
    body: Body,
    catalog: &SetCatalog,
    sinks: CardSinks<'_, '_>,
    pb: &ProgressBar,
) -> anyhow::Result<LoadStats> {
    let CardSinks {
        buffer,
        card_trigrams,
        artists,
    } = sinks;
    let progress = ByteProgress::new(pb, body.counter.clone(), body.total_bytes);
    let mut stats = LoadStats::default();

    for_each_element(body.reader, |raw| -> Result<(), StoreError> {
        stats.elements += 1;
        let card = match sonic_rs::from_str::<RemoteCard>(raw.get()) {
            Ok(card) => card,
            Err(e) => {
                stats.parse_errors += 1;
                log::debug!("card #{}: {e}", stats.elements);
                return Ok(());
            }
        };
        stats.parsed += 1;

        let Some(set) = catalog.get(&card.set) else {
            stats.skipped += 1;
            progress.tick(&stats);
            return Ok(());
        };

        buffer.push(set_card_document(set, &card)?);
        stats.documents += 1;
        card_trigrams.track(&card.id, &card.name);
        artists.track(&card, &set.id);
        progress.tick(&stats);
        Ok(())
    })
    .context("Failed to stream card export")?;

    if artists.cards_without_artist() > 0 {
        log::debug!(
            "{} ingested cards carry no artist id",
            fmt_num(artists.cards_without_artist())
        );
    }
    log::info!(
        "Cards: {} read, {} ingested, {} skipped, {} parse errors",
        fmt_num(stats.elements),
        fmt_num(stats.documents),
        fmt_num(stats.skipped),
        fmt_num(stats.parse_errors)
    );
    Ok(stats)
}
