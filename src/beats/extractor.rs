//! Story beat extraction through an LLM provider.

use super::defaults::default_beats;
use super::models::Beat;
use super::parser::{BeatParser, JsonBeatParser, LineBeatParser};
use crate::agent::llm::{CompletionOptions, FinishReason, LlmProvider, Message};
use crate::server::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are a music curator and creative assistant that creates music playlists inspired by the emotional tone of films and TV shows.";

/// Why the default beats were used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    ProviderError,
    Timeout,
    Unparseable,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::ProviderError => "provider_error",
            FallbackReason::Timeout => "timeout",
            FallbackReason::Unparseable => "unparseable",
        }
    }
}

/// Where a list of beats came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatSource {
    Parsed { parser: &'static str },
    Fallback(FallbackReason),
}

#[derive(Debug, Clone)]
pub struct BeatExtraction {
    pub beats: Vec<Beat>,
    pub source: BeatSource,
}

impl BeatExtraction {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, BeatSource::Fallback(_))
    }
}

/// Asks the model for a title's story beats and parses the answer.
///
/// Extraction never fails: provider errors, timeouts and unparseable answers
/// all resolve to the default beat list.
pub struct BeatExtractor {
    provider: Arc<dyn LlmProvider>,
    parsers: Vec<Box<dyn BeatParser>>,
    options: CompletionOptions,
    max_beats: usize,
}

impl BeatExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, options: CompletionOptions, max_beats: usize) -> Self {
        Self::with_parsers(
            provider,
            options,
            max_beats,
            vec![Box::new(JsonBeatParser), Box::new(LineBeatParser)],
        )
    }

    /// Create an extractor with a custom parser chain. Parsers are tried in
    /// order and the first one producing beats wins.
    pub fn with_parsers(
        provider: Arc<dyn LlmProvider>,
        options: CompletionOptions,
        max_beats: usize,
        parsers: Vec<Box<dyn BeatParser>>,
    ) -> Self {
        Self {
            provider,
            parsers,
            options,
            max_beats: max_beats.max(1),
        }
    }

    pub async fn extract(&self, title: &str) -> BeatExtraction {
        let messages = build_messages(title, self.options.json_response, self.max_beats);
        let started = Instant::now();

        let completion = tokio::time::timeout(
            self.options.timeout,
            self.provider.complete(&messages, &self.options),
        )
        .await;

        let content = match completion {
            Ok(Ok(response)) => {
                if response.finish_reason != FinishReason::Stop {
                    warn!(
                        stage = "llm",
                        finish_reason = ?response.finish_reason,
                        completion_tokens = response.usage.map(|u| u.completion_tokens),
                        "Model output may be incomplete"
                    );
                }
                response.message.content
            }
            Ok(Err(e)) => {
                warn!(
                    stage = "llm",
                    provider = self.provider.name(),
                    error = %e,
                    "Beat extraction failed, using default beats"
                );
                metrics::record_upstream_error("llm");
                return self.fallback(FallbackReason::ProviderError);
            }
            Err(_) => {
                warn!(
                    stage = "llm",
                    provider = self.provider.name(),
                    timeout_secs = self.options.timeout.as_secs_f64(),
                    "Beat extraction timed out, using default beats"
                );
                metrics::record_upstream_error("llm");
                return self.fallback(FallbackReason::Timeout);
            }
        };

        for parser in &self.parsers {
            match parser.parse(&content) {
                Ok(mut beats) => {
                    beats.truncate(self.max_beats);
                    info!(
                        parser = parser.name(),
                        beat_count = beats.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Extracted story beats"
                    );
                    return BeatExtraction {
                        beats,
                        source: BeatSource::Parsed {
                            parser: parser.name(),
                        },
                    };
                }
                Err(e) => {
                    debug!(parser = parser.name(), error = %e, "Beat parser found nothing");
                }
            }
        }

        warn!(
            stage = "parse",
            content_length = content.len(),
            "No beats found in model output, using default beats"
        );
        self.fallback(FallbackReason::Unparseable)
    }

    fn fallback(&self, reason: FallbackReason) -> BeatExtraction {
        metrics::record_beats_fallback(reason.as_str());
        let mut beats = default_beats();
        beats.truncate(self.max_beats);
        BeatExtraction {
            beats,
            source: BeatSource::Fallback(reason),
        }
    }
}

fn beat_count_phrase(max_beats: usize) -> String {
    if max_beats > 4 {
        format!("4 to {}", max_beats)
    } else {
        max_beats.to_string()
    }
}

fn build_messages(title: &str, json_response: bool, max_beats: usize) -> Vec<Message> {
    let count = beat_count_phrase(max_beats);
    let user = if json_response {
        format!(
            "Break down the film or TV show \"{title}\" into {count} emotional story beats. \
             For each beat give a short description, the mood, one music genre, the energy \
             level (low, medium, high or intense), the tempo (slow, medium, fast or a BPM range \
             such as \"90-110 BPM\") and up to three keywords.\n\
             Respond with JSON only, shaped as \
             {{\"beats\":[{{\"description\":\"...\",\"mood\":\"...\",\"genre\":\"...\",\
             \"energy\":\"...\",\"tempo\":\"...\",\"keywords\":[\"...\"]}}]}}."
        )
    } else {
        format!(
            "Break down the film or TV show \"{title}\" into {count} emotional story beats. \
             Use exactly this format for each beat:\n\n\
             Beat: <short description>\n\
             Genre: <one music genre>\n\
             Mood: <mood>\n\
             Energy: <low, medium, high or intense>\n\
             Tempo: <slow, medium, fast or a BPM range>\n\
             Keywords: <up to three comma separated keywords>"
        )
    };
    vec![Message::system(SYSTEM_PROMPT), Message::user(user)]
}
