use super::scorer::ScoredTrack;
use std::cmp::Ordering;

/// How many tracks a beat keeps and which ones qualify.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionPolicy {
    pub per_beat: usize,
    /// Minimum text score. Enrichment-based rules never count here, so a
    /// track is never excluded for lacking enrichment data.
    pub min_text_score: Option<f64>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            per_beat: 3,
            min_text_score: None,
        }
    }
}

impl SelectionPolicy {
    /// Best `per_beat` tracks by score. Ties keep their input order.
    pub fn select(&self, scored: Vec<ScoredTrack>) -> Vec<ScoredTrack> {
        let mut kept: Vec<ScoredTrack> = scored
            .into_iter()
            .filter(|t| self.min_text_score.map_or(true, |min| t.text_score >= min))
            .collect();
        kept.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        kept.truncate(self.per_beat);
        kept
    }
}
