//! Public playlist response shape and its assembly from per-beat picks.

use crate::beats::{Beat, EnergyLevel};
use crate::scoring::ScoredTrack;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize)]
pub struct TrackResponse {
    pub id: String,
    pub name: String,
    /// Comma-joined artist names.
    pub artists: String,
    pub album: String,
    pub spotify_url: String,
    pub image: String,
    pub duration_ms: u64,
    pub popularity: u32,
    pub preview_url: Option<String>,
    #[serde(rename = "relevanceScore")]
    pub relevance_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub happiness: Option<f64>,
    #[serde(rename = "beatIndex")]
    pub beat_index: usize,
    #[serde(rename = "beatMood")]
    pub beat_mood: String,
    #[serde(rename = "beatEnergy")]
    pub beat_energy: EnergyLevel,
    #[serde(rename = "beatGenre")]
    pub beat_genre: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnergyDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub intense: usize,
}

impl EnergyDistribution {
    fn add(&mut self, energy: EnergyLevel) {
        match energy {
            EnergyLevel::Low => self.low += 1,
            EnergyLevel::Medium => self.medium += 1,
            EnergyLevel::High => self.high += 1,
            EnergyLevel::Intense => self.intense += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStats {
    pub tracks_with_audio_data: usize,
    pub average_bpm: Option<f64>,
    pub energy_distribution: EnergyDistribution,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub playlist: Vec<TrackResponse>,
    pub total_tracks: usize,
    pub story_beats: Vec<Beat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<PlaylistStats>,
}

#[derive(Debug, Clone)]
pub struct ResponseAssembler {
    pub max_tracks: usize,
    pub placeholder_image_url: String,
    pub include_stats: bool,
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl TrackResponse {
    fn has_audio_data(&self) -> bool {
        self.bpm.is_some()
            || self.key.is_some()
            || self.energy.is_some()
            || self.danceability.is_some()
            || self.happiness.is_some()
    }
}

impl ResponseAssembler {
    /// Build the response from picks in beat order. The first occurrence of
    /// each id wins and the playlist is capped at `max_tracks`.
    pub fn assemble(&self, beats: Vec<Beat>, picks: Vec<ScoredTrack>) -> PlaylistResponse {
        let mut seen: HashSet<String> = HashSet::new();
        let playlist: Vec<TrackResponse> = picks
            .into_iter()
            .filter(|pick| pick.beat_index < beats.len())
            .filter(|pick| seen.insert(pick.track.id.clone()))
            .take(self.max_tracks)
            .map(|pick| self.track_response(&beats[pick.beat_index], pick))
            .collect();

        let stats = self.include_stats.then(|| Self::stats(&playlist));

        PlaylistResponse {
            total_tracks: playlist.len(),
            playlist,
            story_beats: beats,
            stats,
        }
    }

    fn track_response(&self, beat: &Beat, pick: ScoredTrack) -> TrackResponse {
        let ScoredTrack {
            track,
            score,
            beat_index,
            ..
        } = pick;
        let enrichment = track.enrichment.clone().unwrap_or_default();
        TrackResponse {
            artists: track.artists_joined(),
            id: track.id,
            name: track.name,
            album: track.album,
            spotify_url: track.external_url,
            image: track
                .image_url
                .unwrap_or_else(|| self.placeholder_image_url.clone()),
            duration_ms: track.duration_ms,
            popularity: track.popularity,
            preview_url: track.preview_url,
            relevance_score: round_to(score, 2),
            bpm: enrichment.bpm,
            key: enrichment.key,
            energy: enrichment.energy,
            danceability: enrichment.danceability,
            happiness: enrichment.valence,
            beat_index,
            beat_mood: beat.mood.clone(),
            beat_energy: beat.energy,
            beat_genre: beat.genre.clone(),
        }
    }

    fn stats(playlist: &[TrackResponse]) -> PlaylistStats {
        let bpms: Vec<f64> = playlist.iter().filter_map(|t| t.bpm).collect();
        let average_bpm = (!bpms.is_empty())
            .then(|| round_to(bpms.iter().sum::<f64>() / bpms.len() as f64, 1));

        let mut energy_distribution = EnergyDistribution::default();
        for track in playlist {
            energy_distribution.add(track.beat_energy);
        }

        PlaylistStats {
            tracks_with_audio_data: playlist.iter().filter(|t| t.has_audio_data()).count(),
            average_bpm,
            energy_distribution,
        }
    }
}
