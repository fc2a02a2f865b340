use crate::enrichment::TrackEnrichment;

/// A track returned by the catalog search, normalized from the service
/// representation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub external_url: String,
    pub image_url: Option<String>,
    pub duration_ms: u64,
    /// 0-100
    pub popularity: u32,
    pub preview_url: Option<String>,
    pub explicit: bool,
    pub enrichment: Option<TrackEnrichment>,
}

impl CandidateTrack {
    /// Minimal track with a Spotify-style external URL, mostly for stubs.
    pub fn new(id: impl Into<String>, name: impl Into<String>, artist: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            external_url: format!("https://open.spotify.com/track/{}", id),
            id,
            name: name.into(),
            artists: vec![artist.into()],
            album: String::new(),
            image_url: None,
            duration_ms: 0,
            popularity: 0,
            preview_url: None,
            explicit: false,
            enrichment: None,
        }
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    pub fn artists_joined(&self) -> String {
        self.artists.join(", ")
    }

    /// A usable track has an id, a name, at least one artist and a link.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.name.trim().is_empty()
            && self.artists.iter().any(|a| !a.trim().is_empty())
            && !self.external_url.trim().is_empty()
    }

    pub fn bpm(&self) -> Option<f64> {
        self.enrichment.as_ref().and_then(|e| e.bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_requires_core_fields() {
        let track = CandidateTrack::new("t1", "Time", "Hans Zimmer");
        assert!(track.is_valid());

        let mut no_artist = track.clone();
        no_artist.artists = vec!["  ".to_string()];
        assert!(!no_artist.is_valid());

        let mut no_url = track.clone();
        no_url.external_url.clear();
        assert!(!no_url.is_valid());

        assert!(!CandidateTrack::new("", "Time", "Hans Zimmer").is_valid());
    }

    #[test]
    fn artists_are_joined() {
        let mut track = CandidateTrack::new("t1", "Song", "A");
        track.artists.push("B".to_string());
        assert_eq!(track.artists_joined(), "A, B");
        assert_eq!(track.primary_artist(), Some("A"));
    }
}
