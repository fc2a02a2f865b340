//! Deterministic stand-ins for the external services

use super::constants::*;
use async_trait::async_trait;
use soundstory_server::agent::llm::{
    CompletionOptions, CompletionResponse, FinishReason, LlmError, LlmProvider, Message,
    MessageRole,
};
use soundstory_server::catalog::{CandidateTrack, CatalogError, TrackCatalog};
use soundstory_server::enrichment::{EnrichmentError, TrackEnricher, TrackEnrichment};
use std::sync::atomic::{AtomicUsize, Ordering};

const STUB_BEATS_JSON: &str = r#"{"beats": [
    {"beat": "Dream layers", "mood": "mysterious", "genre": "ambient", "energy": "low", "tempo": "slow", "keywords": ["dream"]},
    {"beat": "The heist", "mood": "tense", "genre": "electronic", "energy": "high", "tempo": "fast"},
    {"beat": "The kick", "mood": "epic", "genre": "orchestral", "energy": "intense", "tempo": "140-160"}
]}"#;

/// Answers with three fixed beats, or fails when the title carries
/// [`FAILING_LLM_MARKER`].
#[derive(Default)]
pub struct StubLlm {
    calls: AtomicUsize,
}

impl StubLlm {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    async fn complete(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let asks_failing_title = messages
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .any(|m| m.content.contains(FAILING_LLM_MARKER));
        if asks_failing_title {
            return Err(LlmError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            });
        }
        Ok(CompletionResponse {
            message: Message::assistant(STUB_BEATS_JSON),
            finish_reason: FinishReason::Stop,
            usage: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBehavior {
    /// Query-specific tracks plus [`SHARED_TRACK_IDS`]
    Tracks,
    Empty,
    Failing,
}

pub struct StubCatalog {
    behavior: CatalogBehavior,
    queries: AtomicUsize,
}

impl StubCatalog {
    pub fn new(behavior: CatalogBehavior) -> Self {
        Self {
            behavior,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

fn slug(query: &str) -> String {
    query
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[async_trait]
impl TrackCatalog for StubCatalog {
    fn name(&self) -> &str {
        "stub-catalog"
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateTrack>, CatalogError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            CatalogBehavior::Empty => Ok(Vec::new()),
            CatalogBehavior::Failing => Err(CatalogError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            }),
            CatalogBehavior::Tracks => {
                let mut tracks: Vec<CandidateTrack> = SHARED_TRACK_IDS
                    .iter()
                    .map(|id| CandidateTrack::new(*id, "Shared Theme", "Session Players"))
                    .collect();
                tracks.extend((0..TRACKS_PER_QUERY).map(|i| {
                    let mut track = CandidateTrack::new(
                        format!("{}-{}", slug(query), i),
                        format!("{} {}", query, i),
                        format!("Artist {}", i),
                    );
                    track.popularity = 40 + i as u32 * 10;
                    if i % 2 == 0 {
                        track.image_url = Some(format!("https://img.example.com/{}.jpg", i));
                    }
                    track
                }));
                tracks.truncate(limit.max(1));
                Ok(tracks)
            }
        }
    }
}

/// Reports [`STUB_BPM`] for every lookup of an "Artist 0" track, nothing otherwise.
#[derive(Default)]
pub struct StubEnricher {
    lookups: AtomicUsize,
}

impl StubEnricher {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackEnricher for StubEnricher {
    fn name(&self) -> &str {
        "stub-enricher"
    }

    async fn lookup(
        &self,
        artist: &str,
        _title: &str,
    ) -> Result<Option<TrackEnrichment>, EnrichmentError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if artist == "Artist 0" {
            Ok(Some(TrackEnrichment::with_bpm(STUB_BPM)))
        } else {
            Ok(None)
        }
    }
}
