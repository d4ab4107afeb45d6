//! Run summary: per-stage status, counts and timings

use std::time::Duration;

use cardex_core::fmt_num;
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use crate::loader::LoadStats;
use crate::stage::{PipelineState, Stage, StageStatus};

/// What one stage did.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    pub stats: LoadStats,
    pub elapsed: Duration,
    /// Free-form remark (skip reason, truncation, error)
    pub note: Option<String>,
}

impl StageReport {
    pub fn new(stage: Stage, status: StageStatus) -> Self {
        Self {
            stage,
            status,
            stats: LoadStats::default(),
            elapsed: Duration::ZERO,
            note: None,
        }
    }

    fn status_cell(&self) -> Cell {
        let color = match self.status {
            StageStatus::Completed => Color::Green,
            StageStatus::Skipped | StageStatus::NotRun => Color::DarkGrey,
            StageStatus::Failed => Color::Red,
        };
        Cell::new(self.status.to_string()).fg(color)
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub state: PipelineState,
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Complete
    }

    pub fn documents_written(&self) -> usize {
        self.stages.iter().map(|r| r.stats.writes.written).sum()
    }

    /// Format summary table as a string.
    pub fn format_table(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Stage")
                    .fg(Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Status").fg(Color::Cyan),
                Cell::new("Read").fg(Color::Cyan),
                Cell::new("Errors").fg(Color::Cyan),
                Cell::new("Skipped").fg(Color::Cyan),
                Cell::new("Written").fg(Color::Cyan),
                Cell::new("Time").fg(Color::Cyan),
                Cell::new("Note").fg(Color::Cyan),
            ]);

        for r in &self.stages {
            let writes = &r.stats.writes;
            let written = if writes.failures.is_empty() {
                fmt_num(writes.written)
            } else {
                format!("{} ({} failed)", fmt_num(writes.written), writes.failures.len())
            };
            table.add_row(vec![
                Cell::new(r.stage.name()),
                r.status_cell(),
                Cell::new(fmt_num(r.stats.elements)),
                Cell::new(fmt_num(r.stats.parse_errors)),
                Cell::new(fmt_num(r.stats.skipped)),
                Cell::new(written),
                Cell::new(format!("{:.1}s", r.elapsed.as_secs_f64())),
                Cell::new(r.note.as_deref().unwrap_or("")),
            ]);
        }

        format!(
            "\n{table}\nRun {} in {:.1}s, {} documents written",
            self.state,
            self.elapsed.as_secs_f64(),
            fmt_num(self.documents_written())
        )
    }

    /// Print summary table to stderr.
    pub fn print(&self) {
        eprintln!("{}", self.format_table());
    }

    /// Log one line per stage (non-TTY mode).
    pub fn log(&self) {
        for r in &self.stages {
            log::info!(
                "{}: {} read={} errors={} skipped={} written={} failed={} [{:.1}s]{}",
                r.stage,
                r.status,
                r.stats.elements,
                r.stats.parse_errors,
                r.stats.skipped,
                r.stats.writes.written,
                r.stats.writes.failures.len(),
                r.elapsed.as_secs_f64(),
                r.note.as_deref().map(|n| format!(" ({n})")).unwrap_or_default()
            );
        }
        log::info!(
            "Run {} in {:.1}s, {} documents written",
            self.state,
            self.elapsed.as_secs_f64(),
            self.documents_written()
        );
    }
}
