use super::profile::{BeatProfile, TrackText};
use super::rules::{RuleTable, ScoringContext};
use crate::beats::Beat;
use crate::catalog::CandidateTrack;

/// A candidate with its relevance score for one beat.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrack {
    pub track: CandidateTrack,
    pub score: f64,
    /// Part of `score` from rules that do not read enrichment data.
    pub text_score: f64,
    pub beat_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    table: RuleTable,
}

impl RelevanceScorer {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Score candidates for a beat, keeping their order.
    pub fn score(
        &self,
        beat_index: usize,
        beat: &Beat,
        candidates: Vec<CandidateTrack>,
    ) -> Vec<ScoredTrack> {
        let profile = BeatProfile::from_beat(beat);
        candidates
            .into_iter()
            .map(|track| {
                let text = TrackText::from_track(&track);
                let ctx = ScoringContext {
                    profile: &profile,
                    track: &track,
                    text: &text,
                };
                let mut score = 0.0;
                let mut text_score = 0.0;
                for entry in self.table.rules() {
                    let contribution = entry.weight * entry.rule.evaluate(&ctx);
                    score += contribution;
                    if !entry.rule.uses_enrichment() {
                        text_score += contribution;
                    }
                }
                ScoredTrack {
                    track,
                    score,
                    text_score,
                    beat_index,
                }
            })
            .collect()
    }
}
