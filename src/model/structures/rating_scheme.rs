use crate::model::constants::BASELINE_CONTRIBUTION_THRESHOLD;
use strum_macros::{AsRefStr, EnumIter};

/// The weighting scheme used to turn counters into a rating.
/// Chosen once at startup and held fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RatingScheme {
    /// Kill / down / revive only. Falls and incaps beyond downs are ignored.
    Baseline { contribution_threshold: f64 },
    /// Incap, fall and team-kill aware weighting with a logarithmic falloff
    #[default]
    Extended
}

/// Name-only view of [`RatingScheme`], used for parsing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum RatingSchemeKind {
    Baseline,
    Extended
}

impl RatingScheme {
    pub fn kind(&self) -> RatingSchemeKind {
        match self {
            RatingScheme::Baseline { .. } => RatingSchemeKind::Baseline,
            RatingScheme::Extended => RatingSchemeKind::Extended
        }
    }
}

impl RatingSchemeKind {
    pub fn with_threshold(self, contribution_threshold: Option<f64>) -> RatingScheme {
        match self {
            RatingSchemeKind::Baseline => RatingScheme::Baseline {
                contribution_threshold: contribution_threshold.unwrap_or(BASELINE_CONTRIBUTION_THRESHOLD)
            },
            RatingSchemeKind::Extended => RatingScheme::Extended
        }
    }
}
