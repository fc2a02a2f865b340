//! Per-request orchestration: beats, search, enrichment, scoring, assembly.

use super::assembler::{PlaylistResponse, ResponseAssembler};
use crate::agent::llm::LlmProvider;
use crate::beats::{Beat, BeatExtractor};
use crate::catalog::{SearchOutcome, TrackCatalog, TrackSearcher};
use crate::config::AppConfig;
use crate::enrichment::{enrich_candidates, BatchSettings, EnrichmentBudget, TrackEnricher};
use crate::scoring::{RelevanceScorer, ScoredTrack, SelectionPolicy};
use crate::server::metrics;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Searches worked but nothing survived selection.
    #[error("No matching tracks found")]
    Empty { story_beats: Vec<Beat> },

    /// Every catalog search failed.
    #[error("Track search failed: {message}")]
    Failed { message: String },
}

impl PipelineError {
    pub fn outcome_label(&self) -> &'static str {
        match self {
            PipelineError::Empty { .. } => "empty",
            PipelineError::Failed { .. } => "failed",
        }
    }
}

/// Enrichment wiring for a pipeline.
pub struct EnrichmentStage {
    pub enricher: Arc<dyn TrackEnricher>,
    pub batch: BatchSettings,
    pub max_lookups_per_request: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineTiming {
    /// Wall-clock budget for one request.
    pub time_budget: Duration,
    /// Enrichment is skipped once less than this is left of the budget.
    pub enrichment_cutoff: Duration,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(25),
            enrichment_cutoff: Duration::from_secs(8),
        }
    }
}

pub struct PlaylistPipeline {
    extractor: BeatExtractor,
    searcher: TrackSearcher,
    enrichment: Option<EnrichmentStage>,
    scorer: RelevanceScorer,
    selection: SelectionPolicy,
    assembler: ResponseAssembler,
    timing: PipelineTiming,
}

impl PlaylistPipeline {
    pub fn new(
        extractor: BeatExtractor,
        searcher: TrackSearcher,
        enrichment: Option<EnrichmentStage>,
        scorer: RelevanceScorer,
        selection: SelectionPolicy,
        assembler: ResponseAssembler,
        timing: PipelineTiming,
    ) -> Self {
        Self {
            extractor,
            searcher,
            enrichment,
            scorer,
            selection,
            assembler,
            timing,
        }
    }

    /// Wire a pipeline from resolved configuration. `enricher` is ignored
    /// when enrichment is disabled.
    pub fn from_config(
        config: &AppConfig,
        llm: Arc<dyn LlmProvider>,
        catalog: Arc<dyn TrackCatalog>,
        enricher: Option<Arc<dyn TrackEnricher>>,
    ) -> Self {
        let extractor = BeatExtractor::new(
            llm,
            config.llm.completion_options(),
            config.pipeline.max_beats,
        );
        let searcher = TrackSearcher::new(
            catalog,
            config.catalog.strategies.clone(),
            config.catalog.min_results,
            config.catalog.results_per_query,
        );
        let enrichment = enricher
            .filter(|_| config.enrichment.enabled)
            .map(|enricher| EnrichmentStage {
                enricher,
                batch: config.enrichment.batch_settings(),
                max_lookups_per_request: config.enrichment.max_tracks_per_request,
            });
        let assembler = ResponseAssembler {
            max_tracks: config.pipeline.max_tracks,
            placeholder_image_url: config.pipeline.placeholder_image_url.clone(),
            include_stats: config.pipeline.include_stats,
        };
        let timing = PipelineTiming {
            time_budget: Duration::from_secs(config.pipeline.time_budget_secs),
            enrichment_cutoff: Duration::from_secs(config.pipeline.enrichment_cutoff_secs),
        };

        Self::new(
            extractor,
            searcher,
            enrichment,
            RelevanceScorer::new(config.scoring.rule_table.clone()),
            config.scoring.selection_policy(config.pipeline.tracks_per_beat),
            assembler,
            timing,
        )
    }

    pub fn enrichment_enabled(&self) -> bool {
        self.enrichment.is_some()
    }

    pub async fn generate(&self, title: &str) -> Result<PlaylistResponse, PipelineError> {
        let result = self.run(title).await;
        match &result {
            Ok(_) => metrics::record_playlist_outcome("ok"),
            Err(e) => metrics::record_playlist_outcome(e.outcome_label()),
        }
        result
    }

    async fn run(&self, title: &str) -> Result<PlaylistResponse, PipelineError> {
        let started = Instant::now();
        let deadline = started + self.timing.time_budget;

        let extraction = self.extractor.extract(title).await;
        let fallback_beats = extraction.is_fallback();
        let beats = extraction.beats;

        let mut budget = self
            .enrichment
            .as_ref()
            .map(|stage| EnrichmentBudget::new(stage.max_lookups_per_request));
        let mut used_ids: HashSet<String> = HashSet::new();
        let mut picks: Vec<ScoredTrack> = Vec::new();
        let mut searched = 0;
        let mut failed = 0;
        let mut last_error: Option<String> = None;

        for (beat_index, beat) in beats.iter().enumerate() {
            if Instant::now() >= deadline {
                warn!(
                    beat_index,
                    skipped_beats = beats.len() - beat_index,
                    "Time budget exhausted, skipping remaining beats"
                );
                break;
            }

            searched += 1;
            let mut candidates = match self
                .searcher
                .search_for_beat(beat_index, beat, &used_ids)
                .await
            {
                SearchOutcome::Found(candidates) => candidates,
                SearchOutcome::Failed {
                    attempts,
                    last_error: error,
                } => {
                    failed += 1;
                    warn!(
                        beat_index,
                        attempts,
                        catalog = self.searcher.catalog_name(),
                        error = %error,
                        "All catalog queries failed for beat"
                    );
                    last_error = Some(error);
                    continue;
                }
            };

            if candidates.is_empty() {
                info!(beat_index, mood = %beat.mood, "No candidates for beat");
                continue;
            }

            if let (Some(stage), Some(budget)) = (&self.enrichment, budget.as_mut()) {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining < self.timing.enrichment_cutoff {
                    debug!(
                        beat_index,
                        remaining_ms = remaining.as_millis() as u64,
                        "Skipping enrichment, time budget is low"
                    );
                } else if !budget.is_exhausted() {
                    let report = enrich_candidates(
                        stage.enricher.as_ref(),
                        &mut candidates,
                        budget,
                        &stage.batch,
                        Some(deadline),
                    )
                    .await;
                    debug!(
                        beat_index,
                        attempted = report.attempted,
                        enriched = report.enriched,
                        budget_left = budget.remaining(),
                        "Enrichment done"
                    );
                }
            }

            let candidate_count = candidates.len();
            let selected = self
                .selection
                .select(self.scorer.score(beat_index, beat, candidates));
            for pick in &selected {
                used_ids.insert(pick.track.id.clone());
            }
            info!(
                beat_index,
                mood = %beat.mood,
                genre = %beat.genre,
                energy = %beat.energy,
                candidates = candidate_count,
                selected = selected.len(),
                "Beat processed"
            );
            picks.extend(selected);
        }

        if searched > 0 && failed == searched {
            return Err(PipelineError::Failed {
                message: last_error.unwrap_or_else(|| "catalog unavailable".to_string()),
            });
        }

        let response = self.assembler.assemble(beats, picks);
        info!(
            title,
            fallback_beats,
            beat_count = response.story_beats.len(),
            total_tracks = response.total_tracks,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Playlist generated"
        );

        if response.playlist.is_empty() {
            return Err(PipelineError::Empty {
                story_beats: response.story_beats,
            });
        }
        Ok(response)
    }
}
