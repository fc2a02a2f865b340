//! Relevance scoring of candidate tracks against a beat.

mod profile;
mod rules;
mod scorer;
mod selection;

pub use profile::{BeatProfile, TrackText};
pub use rules::{RuleTable, RuleTableError, ScoringContext, ScoringRule, WeightedRule};
pub use scorer::{RelevanceScorer, ScoredTrack};
pub use selection::SelectionPolicy;
