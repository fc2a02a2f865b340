//! Declarative scoring rules.
//!
//! A track's score is the sum of `weight * factor` over a [`RuleTable`].
//! Factors are in 0..=1; a negative weight turns a rule into a penalty.

use super::profile::{BeatProfile, TrackText};
use crate::beats::vocabulary::CINEMATIC_WORDS;
use crate::catalog::CandidateTrack;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// BPM distance outside the target range over which the tempo factor
/// decays to zero.
const TEMPO_DECAY_BPM: f64 = 40.0;
/// Energy distance outside the band over which the energy factor decays.
const ENERGY_DECAY_POINTS: f64 = 30.0;
const DANCEABILITY_DECAY_POINTS: f64 = 50.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("unknown scoring rule '{0}'")]
    UnknownRule(String),
}

/// Everything a rule may look at.
pub struct ScoringContext<'a> {
    pub profile: &'a BeatProfile,
    pub track: &'a CandidateTrack,
    pub text: &'a TrackText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    /// Fraction of beat terms found in the track's name, album or artists.
    KeywordOverlap,
    /// BPM inside the beat's range, decaying outside it.
    TempoFit,
    /// Energy attribute inside the beat's band, decaying outside it.
    EnergyFit,
    /// Danceability agreeing with the energy level.
    DanceabilityFit,
    /// Name or album looks like a score or soundtrack.
    CinematicBonus,
    Popularity,
    ExplicitPenalty,
}

impl ScoringRule {
    pub const ALL: [ScoringRule; 7] = [
        ScoringRule::KeywordOverlap,
        ScoringRule::TempoFit,
        ScoringRule::EnergyFit,
        ScoringRule::DanceabilityFit,
        ScoringRule::CinematicBonus,
        ScoringRule::Popularity,
        ScoringRule::ExplicitPenalty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringRule::KeywordOverlap => "keyword_overlap",
            ScoringRule::TempoFit => "tempo_fit",
            ScoringRule::EnergyFit => "energy_fit",
            ScoringRule::DanceabilityFit => "danceability_fit",
            ScoringRule::CinematicBonus => "cinematic_bonus",
            ScoringRule::Popularity => "popularity",
            ScoringRule::ExplicitPenalty => "explicit_penalty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rule| rule.as_str() == name.trim())
    }

    pub fn default_weight(&self) -> f64 {
        match self {
            ScoringRule::KeywordOverlap => 40.0,
            ScoringRule::TempoFit => 25.0,
            ScoringRule::EnergyFit => 15.0,
            ScoringRule::DanceabilityFit => 5.0,
            ScoringRule::CinematicBonus => 10.0,
            ScoringRule::Popularity => 5.0,
            ScoringRule::ExplicitPenalty => -20.0,
        }
    }

    /// Rules reading enrichment data. They contribute 0 without it and
    /// never count towards the text score.
    pub fn uses_enrichment(&self) -> bool {
        matches!(
            self,
            ScoringRule::TempoFit | ScoringRule::EnergyFit | ScoringRule::DanceabilityFit
        )
    }

    pub fn evaluate(&self, ctx: &ScoringContext<'_>) -> f64 {
        let enrichment = ctx.track.enrichment.as_ref();
        match self {
            ScoringRule::KeywordOverlap => {
                if ctx.profile.terms.is_empty() {
                    return 0.0;
                }
                let matched = ctx
                    .profile
                    .terms
                    .iter()
                    .filter(|term| ctx.text.contains(term))
                    .count();
                matched as f64 / ctx.profile.terms.len() as f64
            }
            ScoringRule::TempoFit => enrichment
                .and_then(|e| e.bpm)
                .map(|bpm| decay(ctx.profile.bpm_range.distance(bpm), TEMPO_DECAY_BPM))
                .unwrap_or(0.0),
            ScoringRule::EnergyFit => enrichment
                .and_then(|e| e.energy)
                .map(|energy| {
                    let (min, max) = ctx.profile.energy_band;
                    let distance = if energy < min {
                        min - energy
                    } else if energy > max {
                        energy - max
                    } else {
                        0.0
                    };
                    decay(distance, ENERGY_DECAY_POINTS)
                })
                .unwrap_or(0.0),
            ScoringRule::DanceabilityFit => enrichment
                .and_then(|e| e.danceability)
                .map(|d| {
                    decay(
                        (d - ctx.profile.target_danceability()).abs(),
                        DANCEABILITY_DECAY_POINTS,
                    )
                })
                .unwrap_or(0.0),
            ScoringRule::CinematicBonus => {
                let cinematic = CINEMATIC_WORDS
                    .iter()
                    .any(|word| ctx.text.title_album_contains(word));
                if cinematic {
                    1.0
                } else {
                    0.0
                }
            }
            ScoringRule::Popularity => f64::from(ctx.track.popularity.min(100)) / 100.0,
            ScoringRule::ExplicitPenalty => {
                if ctx.track.explicit {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// 1 at distance 0, linearly down to 0 at `span`.
fn decay(distance: f64, span: f64) -> f64 {
    (1.0 - distance / span).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedRule {
    pub rule: ScoringRule,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: Vec<WeightedRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(
            ScoringRule::ALL
                .into_iter()
                .map(|rule| WeightedRule {
                    rule,
                    weight: rule.default_weight(),
                })
                .collect(),
        )
    }
}

impl RuleTable {
    pub fn new(rules: Vec<WeightedRule>) -> Self {
        Self { rules }
    }

    /// Default table with weights replaced by name, e.g. from
    /// `[scoring.weights]`. A weight of 0 disables a rule.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Result<Self, RuleTableError> {
        let mut table = Self::default();
        for (name, weight) in overrides {
            let rule = ScoringRule::from_name(name)
                .ok_or_else(|| RuleTableError::UnknownRule(name.clone()))?;
            for entry in table.rules.iter_mut().filter(|e| e.rule == rule) {
                entry.weight = *weight;
            }
        }
        Ok(table)
    }

    pub fn rules(&self) -> &[WeightedRule] {
        &self.rules
    }

    pub fn weight_of(&self, rule: ScoringRule) -> Option<f64> {
        self.rules.iter().find(|e| e.rule == rule).map(|e| e.weight)
    }
}
