//! Per-beat matching profile and per-track text view used by the rules.

use crate::beats::vocabulary::mood_synonyms;
use crate::beats::{Beat, BpmRange, EnergyLevel};
use crate::catalog::CandidateTrack;

/// What a beat asks of a track, derived once per beat.
#[derive(Debug, Clone)]
pub struct BeatProfile {
    pub energy: EnergyLevel,
    /// Lowercase search terms: mood, genre words, mood synonyms, keywords.
    pub terms: Vec<String>,
    pub bpm_range: BpmRange,
    /// Band of the 0-100 energy attribute.
    pub energy_band: (f64, f64),
}

impl BeatProfile {
    pub fn from_beat(beat: &Beat) -> Self {
        let mut terms: Vec<String> = Vec::new();
        let mut push = |term: &str| {
            let term = term.trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        };

        push(&beat.mood);
        for word in beat.genre.split_whitespace() {
            push(word);
        }
        for synonym in mood_synonyms(&beat.mood) {
            push(synonym);
        }
        for keyword in &beat.keywords {
            push(keyword);
        }

        Self {
            energy: beat.energy,
            terms,
            bpm_range: beat.target_bpm_range(),
            energy_band: beat.energy.energy_band(),
        }
    }

    /// Danceability (0-100) typical of the beat's energy level.
    pub fn target_danceability(&self) -> f64 {
        match self.energy {
            EnergyLevel::Low => 30.0,
            EnergyLevel::Medium => 50.0,
            EnergyLevel::High => 70.0,
            EnergyLevel::Intense => 80.0,
        }
    }
}

/// Lowercased text of a track, split for word matching.
#[derive(Debug, Clone)]
pub struct TrackText {
    /// Name, album and artists.
    pub full: String,
    /// Name and album only.
    pub title_album: String,
    words: Vec<String>,
    title_album_words: Vec<String>,
}

fn words_of(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

impl TrackText {
    pub fn from_track(track: &CandidateTrack) -> Self {
        let title_album = format!("{} {}", track.name, track.album).to_lowercase();
        let full = format!("{} {}", title_album, track.artists.join(" ").to_lowercase());
        Self {
            words: words_of(&full),
            title_album_words: words_of(&title_album),
            full,
            title_album,
        }
    }

    /// Single words match whole words; phrases match as substrings.
    pub fn contains(&self, term: &str) -> bool {
        if term.contains(|c: char| !c.is_alphanumeric()) {
            self.full.contains(term)
        } else {
            self.words.iter().any(|w| w == term)
        }
    }

    pub fn title_album_contains(&self, term: &str) -> bool {
        if term.contains(|c: char| !c.is_alphanumeric()) {
            self.title_album.contains(term)
        } else {
            self.title_album_words.iter().any(|w| w == term)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beats::Tempo;

    #[test]
    fn profile_collects_unique_terms() {
        let beat = Beat::new("x", "sad", "indie folk", EnergyLevel::Low, Tempo::Slow)
            .with_keywords(["rain", "sad"]);
        let profile = BeatProfile::from_beat(&beat);
        assert_eq!(profile.terms[0], "sad");
        assert!(profile.terms.contains(&"indie".to_string()));
        assert!(profile.terms.contains(&"folk".to_string()));
        assert!(profile.terms.contains(&"melancholy".to_string()));
        assert!(profile.terms.contains(&"rain".to_string()));
        assert_eq!(profile.terms.iter().filter(|t| *t == "sad").count(), 1);
        assert_eq!(profile.bpm_range, BpmRange::new(60.0, 90.0));
        assert_eq!(profile.energy_band, (0.0, 40.0));
    }

    #[test]
    fn track_text_matches_whole_words() {
        let track = CandidateTrack {
            album: "Ghost Stories".to_string(),
            ..CandidateTrack::new("1", "Midnight Rain", "Coldplay")
        };
        let text = TrackText::from_track(&track);
        assert!(text.contains("rain"));
        assert!(text.contains("coldplay"));
        assert!(!text.contains("ost"));
        assert!(text.contains("ghost stories"));
        assert!(!text.title_album_contains("coldplay"));
    }
}
