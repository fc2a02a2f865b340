use serde::Serialize;

/// Audio attributes joined onto a catalog track. Every value is optional;
/// 0-100 scales for energy, danceability and valence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackEnrichment {
    pub bpm: Option<f64>,
    pub key: Option<String>,
    pub energy: Option<f64>,
    pub danceability: Option<f64>,
    pub valence: Option<f64>,
}

impl TrackEnrichment {
    pub fn with_bpm(bpm: f64) -> Self {
        Self {
            bpm: Some(bpm),
            ..Default::default()
        }
    }

    /// True when none of the attributes carry data.
    pub fn is_empty(&self) -> bool {
        self.bpm.is_none()
            && self.key.is_none()
            && self.energy.is_none()
            && self.danceability.is_none()
            && self.valence.is_none()
    }
}
