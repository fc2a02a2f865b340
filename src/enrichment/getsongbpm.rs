//! GetSongBPM API client.
//!
//! Two calls per lookup: a combined song/artist search, then a song detail
//! request for the best match. Calls are spaced by a minimum interval.

use super::matching::match_similarity;
use super::models::TrackEnrichment;
use super::provider::{EnrichmentError, TrackEnricher};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.getsong.co";

pub struct GetSongBpmClient {
    client: Client,
    base_url: String,
    api_key: String,
    min_request_interval: Duration,
    min_similarity: f64,
    last_request: Mutex<Instant>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    /// A list of hits, or an object like `{"error": "no result"}`.
    #[serde(default)]
    search: Value,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    artist: Option<HitArtist>,
}

#[derive(Debug, Deserialize)]
struct HitArtist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SongEnvelope {
    song: Option<SongDetail>,
}

#[derive(Debug, Deserialize)]
struct SongDetail {
    #[serde(default)]
    tempo: Option<Value>,
    #[serde(default)]
    key_of: Option<String>,
    #[serde(default)]
    energy: Option<Value>,
    #[serde(default)]
    danceability: Option<Value>,
    #[serde(default, alias = "valence")]
    happiness: Option<Value>,
}

/// Numbers come back either as JSON numbers or as strings.
fn lenient_number(value: &Option<Value>) -> Option<f64> {
    let n = match value.as_ref()? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (n.is_finite() && n > 0.0).then_some(n)
}

impl From<SongDetail> for TrackEnrichment {
    fn from(song: SongDetail) -> Self {
        TrackEnrichment {
            bpm: lenient_number(&song.tempo),
            key: song
                .key_of
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            energy: lenient_number(&song.energy).map(|v| v.min(100.0)),
            danceability: lenient_number(&song.danceability).map(|v| v.min(100.0)),
            valence: lenient_number(&song.happiness).map(|v| v.min(100.0)),
        }
    }
}

impl GetSongBpmClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        min_request_interval: Duration,
        min_similarity: f64,
    ) -> Self {
        let base_url: String = base_url.into();
        let last_request = Instant::now()
            .checked_sub(min_request_interval)
            .unwrap_or_else(Instant::now);
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            min_request_interval,
            min_similarity,
            last_request: Mutex::new(last_request),
        }
    }

    async fn rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_request_interval {
            tokio::time::sleep(self.min_request_interval - elapsed).await;
        }
        *last = Instant::now();
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, EnrichmentError> {
        self.rate_limit().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Err(EnrichmentError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))
    }

    fn search_url(&self, artist: &str, title: &str) -> String {
        let lookup = format!("song:{} artist:{}", title, artist);
        format!(
            "{}/search/?api_key={}&type=both&lookup={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&lookup)
        )
    }

    fn song_url(&self, id: &str) -> String {
        format!(
            "{}/song/?api_key={}&id={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(id)
        )
    }

    /// Best hit at or above the similarity threshold.
    fn best_match<'a>(&self, hits: &'a [SearchHit], artist: &str, title: &str) -> Option<&'a SearchHit> {
        hits.iter()
            .map(|hit| {
                let hit_artist = hit.artist.as_ref().map(|a| a.name.as_str()).unwrap_or("");
                (hit, match_similarity(artist, title, hit_artist, &hit.title))
            })
            .filter(|(_, score)| *score >= self.min_similarity)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(hit, _)| hit)
    }
}

#[async_trait]
impl TrackEnricher for GetSongBpmClient {
    fn name(&self) -> &str {
        "getsongbpm"
    }

    async fn lookup(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<TrackEnrichment>, EnrichmentError> {
        let envelope: SearchEnvelope = self.get_json(&self.search_url(artist, title)).await?;

        let hits: Vec<SearchHit> = match envelope.search {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => {
                debug!(artist, title, "No enrichment search results");
                return Ok(None);
            }
        };

        let Some(hit) = self.best_match(&hits, artist, title) else {
            debug!(
                artist,
                title,
                hits = hits.len(),
                "No enrichment result above similarity threshold"
            );
            return Ok(None);
        };

        let envelope: SongEnvelope = self.get_json(&self.song_url(&hit.id)).await?;
        let enrichment = envelope.song.map(TrackEnrichment::from);
        Ok(enrichment.filter(|e| !e.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::{routing::get, Json, Router};
    use std::collections::HashMap;

    #[test]
    fn song_detail_parses_strings_and_numbers() {
        let song: SongEnvelope = serde_json::from_value(serde_json::json!({
            "song": {"id": "x", "title": "Time", "tempo": "125", "key_of": "A♭m",
                     "danceability": 40, "energy": "0"}
        }))
        .unwrap();
        let enrichment = TrackEnrichment::from(song.song.unwrap());
        assert_eq!(enrichment.bpm, Some(125.0));
        assert_eq!(enrichment.key.as_deref(), Some("A♭m"));
        assert_eq!(enrichment.danceability, Some(40.0));
        // zero is treated as missing
        assert_eq!(enrichment.energy, None);
        assert_eq!(enrichment.valence, None);
    }

    #[test]
    fn urls_are_encoded() {
        let client = GetSongBpmClient::new(
            Client::new(),
            "https://api.getsong.co/",
            "k&y",
            Duration::ZERO,
            0.75,
        );
        assert_eq!(
            client.search_url("Hans Zimmer", "Time"),
            "https://api.getsong.co/search/?api_key=k%26y&type=both&lookup=song%3ATime%20artist%3AHans%20Zimmer"
        );
        assert_eq!(client.song_url("abc"), "https://api.getsong.co/song/?api_key=k%26y&id=abc");
    }

    async fn spawn_bpm_server() -> String {
        let app = Router::new()
            .route(
                "/search/",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let lookup = params.get("lookup").cloned().unwrap_or_default();
                    if lookup.contains("Nothing") {
                        return Json(serde_json::json!({"search": {"error": "no result"}}));
                    }
                    Json(serde_json::json!({"search": [
                        {"id": "other", "title": "Completely Different", "artist": {"name": "Someone"}},
                        {"id": "time", "title": "Time", "artist": {"name": "Hans Zimmer"}}
                    ]}))
                }),
            )
            .route(
                "/song/",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    let id = params.get("id").cloned().unwrap_or_default();
                    Json(serde_json::json!({"song": {"id": id, "title": "Time", "tempo": "62", "key_of": "Am"}}))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn lookup_picks_best_match() {
        let base = spawn_bpm_server().await;
        let client = GetSongBpmClient::new(Client::new(), base, "key", Duration::ZERO, 0.75);

        let enrichment = client
            .lookup("Hans Zimmer", "Time (Remastered)")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrichment.bpm, Some(62.0));
        assert_eq!(enrichment.key.as_deref(), Some("Am"));
    }

    #[tokio::test]
    async fn lookup_without_results_is_none() {
        let base = spawn_bpm_server().await;
        let client = GetSongBpmClient::new(Client::new(), base, "key", Duration::ZERO, 0.75);

        assert!(client.lookup("Nobody", "Nothing").await.unwrap().is_none());
        // results exist but none is similar enough
        assert!(client
            .lookup("Taylor Swift", "Shake It Off")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn unreachable_service_is_an_error() {
        let client = GetSongBpmClient::new(
            Client::new(),
            "http://127.0.0.1:9",
            "key",
            Duration::ZERO,
            0.75,
        );
        assert!(client.lookup("Hans Zimmer", "Time").await.is_err());
    }

    #[tokio::test]
    async fn calls_are_spaced_by_min_interval() {
        let client = GetSongBpmClient::new(
            Client::new(),
            DEFAULT_BASE_URL,
            "key",
            Duration::from_millis(40),
            0.75,
        );
        let started = Instant::now();
        client.rate_limit().await;
        client.rate_limit().await;
        client.rate_limit().await;
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
