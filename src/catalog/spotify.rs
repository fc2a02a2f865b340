//! Spotify Web API search client.

use super::error::CatalogError;
use super::models::CandidateTrack;
use super::provider::TrackCatalog;
use super::token::TokenProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Spotify accepts at most 50 results per search page.
const MAX_SEARCH_LIMIT: usize = 50;

pub struct SpotifyCatalog {
    client: Client,
    api_base_url: String,
    market: Option<String>,
    tokens: Arc<dyn TokenProvider>,
}

impl SpotifyCatalog {
    pub fn new(
        client: Client,
        api_base_url: impl Into<String>,
        market: Option<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let api_base_url: String = api_base_url.into();
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            market: market.filter(|m| !m.trim().is_empty()),
            tokens,
        }
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        let mut url = format!(
            "{}/search?q={}&type=track&limit={}",
            self.api_base_url,
            urlencoding::encode(query),
            limit.clamp(1, MAX_SEARCH_LIMIT)
        );
        if let Some(market) = &self.market {
            url.push_str(&format!("&market={}", urlencoding::encode(market)));
        }
        url
    }
}

#[async_trait]
impl TrackCatalog for SpotifyCatalog {
    fn name(&self) -> &str {
        "spotify"
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        let token = self.tokens.access_token().await?;
        let url = self.search_url(query, limit);

        debug!(query, limit, "Searching catalog");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            401 => {
                self.tokens.invalidate().await;
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::Auth(body));
            }
            429 => return Err(CatalogError::RateLimited),
            _ if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(CatalogError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }
            _ => {}
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(format!("search response: {}", e)))?;

        let items = body.tracks.map(|t| t.items).unwrap_or_default();
        let total = items.len();
        let tracks: Vec<CandidateTrack> = items
            .into_iter()
            .flatten()
            .map(CandidateTrack::from)
            .filter(CandidateTrack::is_valid)
            .take(limit)
            .collect();

        if tracks.len() < total {
            debug!(
                query,
                dropped = total - tracks.len(),
                "Dropped invalid or surplus tracks from search results"
            );
        }
        Ok(tracks)
    }
}

// Spotify API types

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Option<SpotifyTrack>>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    #[serde(default)]
    album: Option<SpotifyAlbum>,
    #[serde(default)]
    external_urls: Option<ExternalUrls>,
    #[serde(default)]
    duration_ms: u64,
    #[serde(default)]
    popularity: u32,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    explicit: bool,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    #[serde(default)]
    name: String,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl From<SpotifyTrack> for CandidateTrack {
    fn from(track: SpotifyTrack) -> Self {
        let (album, image_url) = match track.album {
            Some(album) => (album.name, album.images.into_iter().next().map(|i| i.url)),
            None => (String::new(), None),
        };
        CandidateTrack {
            id: track.id.unwrap_or_default(),
            name: track.name,
            artists: track
                .artists
                .into_iter()
                .map(|a| a.name)
                .filter(|n| !n.trim().is_empty())
                .collect(),
            album,
            external_url: track
                .external_urls
                .and_then(|u| u.spotify)
                .unwrap_or_default(),
            image_url,
            duration_ms: track.duration_ms,
            popularity: track.popularity.min(100),
            preview_url: track.preview_url,
            explicit: track.explicit,
            enrichment: None,
        }
    }
}
