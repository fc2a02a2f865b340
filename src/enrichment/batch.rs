//! Batched, budgeted enrichment of search candidates.

use super::provider::TrackEnricher;
use crate::catalog::CandidateTrack;
use crate::server::metrics;
use futures::future::join_all;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How candidates are enriched within a single beat.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub lookup_timeout: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_delay: Duration::from_millis(200),
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

/// Remaining lookups allowed for the current request.
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentBudget {
    remaining: usize,
}

impl EnrichmentBudget {
    pub fn new(max_lookups: usize) -> Self {
        Self {
            remaining: max_lookups,
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub attempted: usize,
    pub enriched: usize,
    pub missed: usize,
    pub failed: usize,
}

enum LookupResult {
    Hit,
    Miss,
    Failed,
}

/// Enrich candidates in place, in list order, within the budget.
///
/// Lookups run concurrently in batches with a delay between batches. No new
/// batch starts once `deadline` has passed. Failures and timeouts leave the
/// candidate unenriched.
pub async fn enrich_candidates(
    enricher: &dyn TrackEnricher,
    candidates: &mut [CandidateTrack],
    budget: &mut EnrichmentBudget,
    settings: &BatchSettings,
    deadline: Option<Instant>,
) -> EnrichmentReport {
    let mut report = EnrichmentReport::default();

    let targets: Vec<(usize, String, String)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.enrichment.is_none())
        .filter_map(|(i, c)| {
            c.primary_artist()
                .map(|artist| (i, artist.to_string(), c.name.clone()))
        })
        .take(budget.remaining)
        .collect();

    if targets.is_empty() {
        return report;
    }

    let batch_size = settings.batch_size.max(1);
    for (batch_index, batch) in targets.chunks(batch_size).enumerate() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!(
                batch_index,
                "Request deadline reached, skipping remaining enrichment"
            );
            break;
        }
        if batch_index > 0 && !settings.batch_delay.is_zero() {
            tokio::time::sleep(settings.batch_delay).await;
        }

        let lookups = batch.iter().map(|(index, artist, title)| async move {
            let result =
                tokio::time::timeout(settings.lookup_timeout, enricher.lookup(artist, title)).await;
            (*index, artist, title, result)
        });

        for (index, artist, title, result) in join_all(lookups).await {
            report.attempted += 1;
            budget.remaining = budget.remaining.saturating_sub(1);

            let outcome = match result {
                Ok(Ok(Some(enrichment))) => {
                    candidates[index].enrichment = Some(enrichment);
                    LookupResult::Hit
                }
                Ok(Ok(None)) => LookupResult::Miss,
                Ok(Err(e)) => {
                    warn!(
                        service = enricher.name(),
                        artist = %artist,
                        title = %title,
                        error = %e,
                        "Enrichment lookup failed, keeping track unenriched"
                    );
                    metrics::record_upstream_error(enricher.name());
                    LookupResult::Failed
                }
                Err(_) => {
                    warn!(
                        service = enricher.name(),
                        artist = %artist,
                        title = %title,
                        timeout_ms = settings.lookup_timeout.as_millis() as u64,
                        "Enrichment lookup timed out, keeping track unenriched"
                    );
                    metrics::record_upstream_error(enricher.name());
                    LookupResult::Failed
                }
            };

            match outcome {
                LookupResult::Hit => {
                    report.enriched += 1;
                    metrics::record_enrichment_lookup("hit");
                }
                LookupResult::Miss => {
                    report.missed += 1;
                    metrics::record_enrichment_lookup("miss");
                }
                LookupResult::Failed => {
                    report.failed += 1;
                    metrics::record_enrichment_lookup("error");
                }
            }
        }
    }

    info!(
        attempted = report.attempted,
        enriched = report.enriched,
        missed = report.missed,
        failed = report.failed,
        budget_left = budget.remaining,
        "Enrichment pass done"
    );
    report
}
