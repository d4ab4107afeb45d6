//! Stage graph of an ingestion run

use std::fmt;

/// Intermediate result handed from one stage to later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    /// Included sets by code
    SetCatalog,
    /// Rulings grouped by oracle id
    RulingGroups,
    ArtistAggregates,
    CardTrigramIndex,
    ArtistTrigramIndex,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SetCatalog => "set catalog",
            Self::RulingGroups => "ruling groups",
            Self::ArtistAggregates => "artist aggregates",
            Self::CardTrigramIndex => "card trigram index",
            Self::ArtistTrigramIndex => "artist trigram index",
        })
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    LoadSets,
    LoadRulings,
    LoadCards,
    WriteArtists,
    WriteRulings,
    WriteTrigrams,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Self::LoadSets,
        Self::LoadRulings,
        Self::LoadCards,
        Self::WriteArtists,
        Self::WriteRulings,
        Self::WriteTrigrams,
    ];

    /// Artifacts that must exist before the stage runs
    pub fn inputs(self) -> &'static [Artifact] {
        match self {
            Self::LoadSets | Self::LoadRulings => &[],
            Self::LoadCards => &[Artifact::SetCatalog],
            Self::WriteArtists => &[Artifact::ArtistAggregates],
            Self::WriteRulings => &[Artifact::RulingGroups],
            Self::WriteTrigrams => &[Artifact::CardTrigramIndex, Artifact::ArtistTrigramIndex],
        }
    }

    /// Artifacts the stage leaves behind
    pub fn outputs(self) -> &'static [Artifact] {
        match self {
            Self::LoadSets => &[Artifact::SetCatalog],
            Self::LoadRulings => &[Artifact::RulingGroups],
            Self::LoadCards => &[
                Artifact::ArtistAggregates,
                Artifact::CardTrigramIndex,
                Artifact::ArtistTrigramIndex,
            ],
            Self::WriteArtists | Self::WriteRulings | Self::WriteTrigrams => &[],
        }
    }

    /// Stages that only exist for rulings
    pub fn is_rulings(self) -> bool {
        matches!(self, Self::LoadRulings | Self::WriteRulings)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LoadSets => "load-sets",
            Self::LoadRulings => "load-rulings",
            Self::LoadCards => "load-cards",
            Self::WriteArtists => "write-artists",
            Self::WriteRulings => "write-rulings",
            Self::WriteTrigrams => "write-trigrams",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    Running(Stage),
    Complete,
    Failed { stage: Stage },
}

impl PipelineState {
    /// Only `Pending` and `Running` can move forward.
    pub fn advance(self, next: Stage) -> Self {
        match self {
            Self::Pending | Self::Running(_) => Self::Running(next),
            done => done,
        }
    }

    pub fn complete(self) -> Self {
        match self {
            Self::Pending | Self::Running(_) => Self::Complete,
            done => done,
        }
    }

    pub fn fail(self, stage: Stage) -> Self {
        Self::Failed { stage }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed { .. })
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Running(stage) => write!(f, "running {stage}"),
            Self::Complete => f.write_str("complete"),
            Self::Failed { stage } => write!(f, "failed in {stage}"),
        }
    }
}

/// Outcome of one stage in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Skipped,
    Failed,
    /// Not reached because an earlier stage failed
    NotRun,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "ok",
            Self::Skipped => "skipped",
            Self::Failed => "FAILED",
            Self::NotRun => "not run",
        })
    }
}
