//! Orchestration of one ingestion run

use std::time::Instant;

use anyhow::Context;
use cardex_core::{ProgressContext, fmt_num};
use cardex_index::{
    ArtistAggregate, ArtistAggregator, Normalization, RulingAggregate, RulingsAggregator,
    TrigramAggregator, TrigramIndex,
};
use cardex_scryfall::{BulkKind, ScryfallClient};
use cardex_store::{DocumentBuffer, DocumentKind, Writer};
use chrono::NaiveDate;
use indicatif::ProgressBar;

use crate::catalog::SetCatalog;
use crate::config::IngestConfig;
use crate::documents::{artist_document, ruling_document, trigram_documents};
use crate::loader::{CardSinks, LoadStats, load_cards, load_rulings, load_sets};
use crate::stage::{Artifact, PipelineState, Stage, StageStatus};
use crate::summary::{RunSummary, StageReport};

/// Artifacts produced so far in this run. Dropped with the run.
#[derive(Default)]
struct RunArtifacts {
    catalog: Option<SetCatalog>,
    rulings: Option<Vec<RulingAggregate>>,
    artists: Option<Vec<ArtistAggregate>>,
    card_trigrams: Option<TrigramIndex>,
    artist_trigrams: Option<TrigramIndex>,
}

impl RunArtifacts {
    fn has(&self, artifact: Artifact) -> bool {
        match artifact {
            Artifact::SetCatalog => self.catalog.is_some(),
            Artifact::RulingGroups => self.rulings.is_some(),
            Artifact::ArtistAggregates => self.artists.is_some(),
            Artifact::CardTrigramIndex => self.card_trigrams.is_some(),
            Artifact::ArtistTrigramIndex => self.artist_trigrams.is_some(),
        }
    }
}

/// Run every stage in order. See [`Pipeline::run`].
pub fn run(
    config: &IngestConfig,
    client: &ScryfallClient,
    writer: &Writer,
    progress: &ProgressContext,
) -> anyhow::Result<RunSummary> {
    Pipeline::new(config, client, writer, progress).run()
}

/// One configured ingestion job.
pub struct Pipeline<'a> {
    config: &'a IngestConfig,
    client: &'a ScryfallClient,
    writer: &'a Writer,
    progress: &'a ProgressContext,
    today: NaiveDate,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a IngestConfig,
        client: &'a ScryfallClient,
        writer: &'a Writer,
        progress: &'a ProgressContext,
    ) -> Self {
        Self {
            config,
            client,
            writer,
            progress,
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Reference date for the preview filter
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run `LoadSets → LoadRulings → LoadCards → WriteArtists → WriteRulings
    /// → WriteTrigrams`.
    ///
    /// The first failing stage stops the run: its error is returned with
    /// context after the summary has been reported. Write failures fail a
    /// stage only after every document of it was attempted.
    pub fn run(&self) -> anyhow::Result<RunSummary> {
        self.config.validate()?;
        let start = Instant::now();
        let mut artifacts = RunArtifacts::default();
        let mut state = PipelineState::Pending;
        let mut reports = Vec::with_capacity(Stage::ALL.len());

        log::info!(
            "cardex ingest starting: rulings={}, cards={}, max_sets={:?}, set_codes={:?}",
            self.config.process_rulings,
            self.config.card_bulk,
            self.config.max_sets,
            self.config.set_codes
        );

        for (i, &stage) in Stage::ALL.iter().enumerate() {
            if self.skips(stage) {
                log::info!("{stage}: skipped, rulings disabled");
                reports.push(self.idle_report(stage));
                continue;
            }

            state = state.advance(stage);
            log::debug!("{stage}: starting");
            let started = Instant::now();
            let pb = self.progress.stage_line(stage.name());
            let outcome = check_inputs(stage, &artifacts)
                .and_then(|()| self.run_stage(stage, &mut artifacts, &pb));
            pb.finish_and_clear();

            let (mut report, error) = match outcome {
                Ok(report) if report.stats.writes.is_success() => (report, None),
                Ok(mut report) => {
                    let writes = &report.stats.writes;
                    writes.log_failures(stage.name());
                    let err = anyhow::anyhow!(
                        "{} of {} document writes failed",
                        writes.failures.len(),
                        writes.attempted
                    );
                    report.status = StageStatus::Failed;
                    (report, Some(err))
                }
                Err(e) => {
                    let mut report = StageReport::new(stage, StageStatus::Failed);
                    report.note = Some(format!("{e:#}"));
                    (report, Some(e))
                }
            };
            report.elapsed = started.elapsed();

            match error {
                None => {
                    log::info!("{stage}: done in {:.1}s", report.elapsed.as_secs_f64());
                    reports.push(report);
                }
                Some(e) => {
                    state = state.fail(stage);
                    reports.push(report);
                    reports.extend(Stage::ALL[i + 1..].iter().map(|&s| self.idle_report(s)));
                    self.report(&RunSummary {
                        state,
                        stages: reports,
                        elapsed: start.elapsed(),
                    });
                    log::error!("Ingestion failed in {stage}: {e:#}");
                    return Err(e.context(format!("Stage {stage} failed")));
                }
            }
        }

        let summary = RunSummary {
            state: state.complete(),
            stages: reports,
            elapsed: start.elapsed(),
        };
        self.report(&summary);
        Ok(summary)
    }

    /// Report for a stage after an earlier one failed. Disabled stages stay skipped.
    fn idle_report(&self, stage: Stage) -> StageReport {
        if self.skips(stage) {
            let mut report = StageReport::new(stage, StageStatus::Skipped);
            report.note = Some("rulings disabled".into());
            report
        } else {
            StageReport::new(stage, StageStatus::NotRun)
        }
    }

    fn skips(&self, stage: Stage) -> bool {
        stage.is_rulings() && !self.config.process_rulings
    }

    fn report(&self, summary: &RunSummary) {
        if self.progress.is_tty() {
            summary.print();
        } else {
            summary.log();
        }
    }

    fn run_stage(
        &self,
        stage: Stage,
        artifacts: &mut RunArtifacts,
        pb: &ProgressBar,
    ) -> anyhow::Result<StageReport> {
        let mut report = StageReport::new(stage, StageStatus::Completed);
        match stage {
            Stage::LoadSets => {
                let mut chain = self.config.filter_chain(self.today);
                let mut catalog = SetCatalog::new();
                let mut buffer = DocumentBuffer::new(self.writer, self.config.batch_size);
                let load = load_sets(
                    self.client,
                    &mut chain,
                    &mut catalog,
                    &mut buffer,
                    self.config.strict_paging,
                    pb,
                )?;
                report.stats = load.stats;
                report.stats.writes = buffer.finish();
                if let Some(reason) = load.paging.truncated {
                    report.note = Some(format!("listing truncated: {reason}"));
                }
                if catalog.is_empty() {
                    log::warn!("No sets passed the filters; no cards will be ingested");
                }
                artifacts.catalog = Some(catalog);
            }
            Stage::LoadRulings => {
                let meta = self.client.find_bulk(BulkKind::Rulings)?;
                let body = self
                    .client
                    .open_bulk(&meta)
                    .context("Failed to open rulings export")?;
                let dl = self.progress.download_bar("rulings");
                let mut rulings = RulingsAggregator::new();
                let stats = load_rulings(body, &mut rulings, &dl);
                dl.finish_and_clear();
                report.stats = stats?;
                artifacts.rulings = Some(rulings.finish());
            }
            Stage::LoadCards => {
                let catalog = artifacts
                    .catalog
                    .as_ref()
                    .context("set catalog missing")?;
                let meta = self.client.find_bulk(self.config.card_bulk)?;
                let body = self
                    .client
                    .open_bulk(&meta)
                    .with_context(|| format!("Failed to open {} export", meta.kind))?;

                let dl = self.progress.download_bar("cards");
                let mut buffer = DocumentBuffer::new(self.writer, self.config.batch_size);
                let mut card_trigrams = TrigramAggregator::new(Normalization::Card);
                let mut artists = ArtistAggregator::new();
                let sinks = CardSinks {
                    buffer: &mut buffer,
                    card_trigrams: &mut card_trigrams,
                    artists: &mut artists,
                };
                let stats = load_cards(body, catalog, sinks, &dl);
                dl.finish_and_clear();
                report.stats = stats?;
                report.stats.writes = buffer.finish();

                let artists = artists.finish();
                pb.set_message(format!("indexing {} artists", fmt_num(artists.len())));
                artifacts.artist_trigrams = Some(artist_trigrams(&artists));
                artifacts.card_trigrams = Some(card_trigrams.finish());
                artifacts.artists = Some(artists);
            }
            Stage::WriteArtists => {
                let artists = artifacts
                    .artists
                    .as_ref()
                    .context("artist aggregates missing")?;
                report.stats = self.write_each(artists, pb, artist_document)?;
            }
            Stage::WriteRulings => {
                let rulings = artifacts
                    .rulings
                    .as_ref()
                    .context("ruling groups missing")?;
                report.stats = self.write_each(rulings, pb, ruling_document)?;
            }
            Stage::WriteTrigrams => {
                let cards = artifacts
                    .card_trigrams
                    .take()
                    .context("card trigram index missing")?;
                let names = artifacts
                    .artist_trigrams
                    .take()
                    .context("artist trigram index missing")?;
                let mut stats = self.write_index(DocumentKind::CardTrigram, cards, pb)?;
                let artist_stats = self.write_index(DocumentKind::ArtistTrigram, names, pb)?;
                stats.elements += artist_stats.elements;
                stats.documents += artist_stats.documents;
                stats.writes.merge(artist_stats.writes);
                report.stats = stats;
            }
        }
        Ok(report)
    }

    /// One document per item through a fresh buffer.
    fn write_each<T>(
        &self,
        items: &[T],
        pb: &ProgressBar,
        to_doc: impl Fn(&T) -> Result<cardex_store::Document, cardex_store::StoreError>,
    ) -> anyhow::Result<LoadStats> {
        let mut stats = LoadStats {
            elements: items.len(),
            ..Default::default()
        };
        let mut buffer = DocumentBuffer::new(self.writer, self.config.batch_size);
        for item in items {
            buffer.push(to_doc(item)?);
            stats.documents += 1;
            if buffer.is_empty() {
                pb.set_message(format!(
                    "{}/{} written",
                    fmt_num(stats.documents),
                    fmt_num(items.len())
                ));
            }
        }
        stats.writes = buffer.finish();
        Ok(stats)
    }

    fn write_index(
        &self,
        kind: DocumentKind,
        index: TrigramIndex,
        pb: &ProgressBar,
    ) -> anyhow::Result<LoadStats> {
        pb.set_message(format!("{kind}: {} trigrams", fmt_num(index.len())));
        let mut stats = LoadStats {
            elements: index.entry_count(),
            ..Default::default()
        };
        let mut buffer = DocumentBuffer::new(self.writer, self.config.batch_size);
        for (trigram, entries) in index.into_sorted() {
            for doc in trigram_documents(kind, &trigram, &entries)? {
                buffer.push(doc);
                stats.documents += 1;
            }
        }
        stats.writes = buffer.finish();
        log::info!(
            "{kind}: {} documents, {} entries",
            fmt_num(stats.documents),
            fmt_num(stats.elements)
        );
        Ok(stats)
    }
}

fn check_inputs(stage: Stage, artifacts: &RunArtifacts) -> anyhow::Result<()> {
    for &input in stage.inputs() {
        anyhow::ensure!(artifacts.has(input), "{stage} needs {input}, which no earlier stage produced");
    }
    Ok(())
}

/// Artist name index: every display name of every artist id.
fn artist_trigrams(artists: &[ArtistAggregate]) -> TrigramIndex {
    let mut index = TrigramAggregator::new(Normalization::Artist);
    for artist in artists {
        for name in &artist.names {
            index.track(&artist.artist_id, name);
        }
    }
    index.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn missing_input_is_an_error() {
        let artifacts = RunArtifacts::default();
        assert!(check_inputs(Stage::LoadSets, &artifacts).is_ok());
        let err = check_inputs(Stage::LoadCards, &artifacts).unwrap_err();
        assert!(err.to_string().contains("set catalog"));
    }

    #[test]
    fn disabled_stages_stay_skipped_after_a_failure() {
        use cardex_core::{RateLimiter, StaticTransport};
        use cardex_store::MemoryStore;
        use std::sync::Arc;
        use std::time::Duration;

        let client = ScryfallClient::new(
            Arc::new(StaticTransport::new()),
            Arc::new(RateLimiter::new(Duration::from_millis(1))),
            "https://api.test",
        );
        let writer = Writer::new(Arc::new(MemoryStore::new()), 1).unwrap();
        let progress = ProgressContext::hidden();
        let config = IngestConfig {
            process_rulings: false,
            ..Default::default()
        };
        let pipeline = Pipeline::new(&config, &client, &writer, &progress);

        assert_eq!(pipeline.idle_report(Stage::WriteRulings).status, StageStatus::Skipped);
        assert_eq!(pipeline.idle_report(Stage::WriteTrigrams).status, StageStatus::NotRun);

        let enabled = IngestConfig::default();
        let pipeline = Pipeline::new(&enabled, &client, &writer, &progress);
        assert_eq!(pipeline.idle_report(Stage::WriteRulings).status, StageStatus::NotRun);
    }

    #[test]
    fn artist_trigrams_cover_every_name() {
        let artists = vec![ArtistAggregate {
            artist_id: "a1".into(),
            names: BTreeSet::from(["Magali Villeneuve".to_string(), "M. Villeneuve".to_string()]),
            card_ids: BTreeSet::new(),
            set_ids: BTreeSet::new(),
        }];
        let index = artist_trigrams(&artists);
        let mag = index.get("mag");
        assert_eq!(mag.len(), 1);
        assert_eq!(mag[0].positions, vec![0]);
        assert_eq!(mag[0].normalized_name, "magalivilleneuve");
        // "mvilleneuve" and "magalivilleneuve" both contain "vil"
        assert_eq!(index.get("vil").len(), 2);
    }
}
