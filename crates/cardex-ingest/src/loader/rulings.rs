use anyhow::Context;
use cardex_core::{Body, for_each_element, fmt_num};
use cardex_index::RulingsAggregator;
use cardex_scryfall::RemoteRuling;
use cardex_store::StoreError;
use indicatif::ProgressBar;

use super::{ByteProgress, LoadStats};

/// Stream the rulings export into `rulings`.
///
/// Rulings that fail to decode are counted and skipped; a broken stream
/// aborts the load.
pub fn load_rulings(
    body: Body,
    rulings: &mut RulingsAggregator,
    pb: &ProgressBar,
) -> anyhow::Result<LoadStats> {
    let progress = ByteProgress::new(pb, body.counter.clone(), body.total_bytes);
    let mut stats = LoadStats::default();

    for_each_element(body.reader, |raw| -> Result<(), StoreError> {
        stats.elements += 1;
        match sonic_rs::from_str::<RemoteRuling>(raw.get()) {
            Ok(ruling) => {
                stats.parsed += 1;
                rulings.track(ruling);
            }
            Err(e) => {
                stats.parse_errors += 1;
                log::debug!("ruling #{}: {e}", stats.elements);
            }
        }
        progress.tick(&stats);
        Ok(())
    })
    .context("Failed to stream rulings export")?;

    log::info!(
        "Rulings: {} read, {} oracle ids, {} parse errors",
        fmt_num(stats.elements),
        fmt_num(rulings.len()),
        fmt_num(stats.parse_errors)
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn body(json: &str) -> Body {
        Body {
            reader: Box::new(Cursor::new(json.as_bytes().to_vec())),
            counter: Default::default(),
            total_bytes: None,
        }
    }

    #[test]
    fn groups_and_counts_bad_records() {
        let json = r#"[
            {"oracle_id": "A", "source": "wotc", "published_at": "2020-01-01", "comment": "one"},
            {"oracle_id": "A", "source": "wotc", "published_at": "2020-01-02", "comment": "two"},
            {"source": "wotc", "published_at": "2020-01-03", "comment": "no oracle id"},
            {"oracle_id": "B", "source": "scryfall", "published_at": "2021-05-05", "comment": "three"}
        ]"#;
        let mut agg = RulingsAggregator::new();
        let stats = load_rulings(body(json), &mut agg, &ProgressBar::hidden()).unwrap();

        assert_eq!(stats.elements, 4);
        assert_eq!(stats.parsed, 3);
        assert_eq!(stats.parse_errors, 1);
        let groups = agg.finish();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rulings.len(), 2);
        assert_eq!(groups[0].rulings[1].comment, "two");
    }

    #[test]
    fn truncated_stream_fails() {
        let json = r#"[{"oracle_id": "A", "published_at": "2020-01-01"}, {"oracle"#;
        let mut agg = RulingsAggregator::new();
        assert!(load_rulings(body(json), &mut agg, &ProgressBar::hidden()).is_err());
    }
}
