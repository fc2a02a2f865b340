//! Per-beat track search with query-strategy escalation.

use super::models::CandidateTrack;
use super::provider::TrackCatalog;
use super::query::QueryStrategy;
use crate::beats::Beat;
use crate::server::metrics;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum SearchOutcome {
    /// At least one query succeeded. The list may still be empty.
    Found(Vec<CandidateTrack>),
    /// Every query failed.
    Failed { attempts: usize, last_error: String },
}

pub struct TrackSearcher {
    catalog: Arc<dyn TrackCatalog>,
    strategies: Vec<QueryStrategy>,
    min_results: usize,
    results_per_query: usize,
}

impl TrackSearcher {
    pub fn new(
        catalog: Arc<dyn TrackCatalog>,
        strategies: Vec<QueryStrategy>,
        min_results: usize,
        results_per_query: usize,
    ) -> Self {
        Self {
            catalog,
            strategies,
            min_results: min_results.max(1),
            results_per_query: results_per_query.max(1),
        }
    }

    pub fn catalog_name(&self) -> &str {
        self.catalog.name()
    }

    /// Run the strategies in order until enough candidates were collected.
    ///
    /// Candidates are unique by id and never include ids from `exclude`.
    /// Failing queries are logged and skipped.
    pub async fn search_for_beat(
        &self,
        beat_index: usize,
        beat: &Beat,
        exclude: &HashSet<String>,
    ) -> SearchOutcome {
        let mut found: Vec<CandidateTrack> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut attempts = 0;
        let mut failures = 0;
        let mut last_error = None;

        'strategies: for strategy in &self.strategies {
            for query in strategy.queries(beat) {
                attempts += 1;
                match self.catalog.search_tracks(&query, self.results_per_query).await {
                    Ok(tracks) => {
                        let before = found.len();
                        for track in tracks {
                            if exclude.contains(&track.id) || !seen.insert(track.id.clone()) {
                                continue;
                            }
                            found.push(track);
                        }
                        debug!(
                            beat_index,
                            strategy = %strategy,
                            query = %query,
                            new_candidates = found.len() - before,
                            total_candidates = found.len(),
                            "Catalog query done"
                        );
                    }
                    Err(e) => {
                        failures += 1;
                        warn!(
                            beat_index,
                            strategy = %strategy,
                            query = %query,
                            error = %e,
                            "Catalog query failed, skipping"
                        );
                        metrics::record_upstream_error(self.catalog.name());
                        last_error = Some(e.to_string());
                    }
                }

                if found.len() >= self.min_results {
                    break 'strategies;
                }
            }
        }

        if attempts > 0 && failures == attempts {
            return SearchOutcome::Failed {
                attempts,
                last_error: last_error.unwrap_or_default(),
            };
        }
        SearchOutcome::Found(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beats::{EnergyLevel, Tempo};
    use crate::catalog::CatalogError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every query with tracks `{prefix}-0..n`, where the prefix is
    /// the first word of the query. Queries containing "fail" error out.
    struct StubCatalog {
        per_query: usize,
        queries: Mutex<Vec<String>>,
        fail_all: bool,
    }

    impl StubCatalog {
        fn new(per_query: usize) -> Arc<Self> {
            Arc::new(Self {
                per_query,
                queries: Mutex::new(Vec::new()),
                fail_all: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                per_query: 0,
                queries: Mutex::new(Vec::new()),
                fail_all: true,
            })
        }
    }

    #[async_trait]
    impl TrackCatalog for StubCatalog {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search_tracks(
            &self,
            query: &str,
            limit: usize,
        ) -> Result<Vec<CandidateTrack>, CatalogError> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail_all || query.contains("fail") {
                return Err(CatalogError::Connection("refused".to_string()));
            }
            let prefix = query.split_whitespace().next().unwrap_or("q");
            Ok((0..self.per_query.min(limit))
                .map(|i| CandidateTrack::new(format!("{}-{}", prefix, i), "Song", "Artist"))
                .collect())
        }
    }

    fn beat() -> Beat {
        Beat::new("Chase", "tense", "electronic", EnergyLevel::High, Tempo::Fast)
    }

    #[tokio::test]
    async fn stops_once_enough_candidates() {
        let catalog = StubCatalog::new(5);
        let searcher = TrackSearcher::new(
            catalog.clone(),
            QueryStrategy::DEFAULT_ORDER.to_vec(),
            8,
            5,
        );

        let SearchOutcome::Found(tracks) = searcher.search_for_beat(0, &beat(), &HashSet::new()).await
        else {
            panic!("expected tracks");
        };
        // direct gives 5, the first synonym query gives 5 more and we stop
        assert_eq!(tracks.len(), 10);
        assert_eq!(catalog.queries.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn dedups_and_excludes_ids() {
        let catalog = StubCatalog::new(3);
        let searcher = TrackSearcher::new(catalog, vec![QueryStrategy::Direct], 8, 5);

        let exclude: HashSet<String> = ["electronic-1".to_string()].into_iter().collect();
        let SearchOutcome::Found(tracks) = searcher.search_for_beat(0, &beat(), &exclude).await
        else {
            panic!("expected tracks");
        };
        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["electronic-0", "electronic-2"]);
    }

    #[tokio::test]
    async fn failing_queries_are_skipped() {
        let catalog = StubCatalog::new(2);
        let searcher = TrackSearcher::new(
            catalog.clone(),
            vec![QueryStrategy::Direct, QueryStrategy::GenericFallback],
            8,
            5,
        );
        let beat = Beat::new("x", "fail", "rock", EnergyLevel::Low, Tempo::Slow);

        // "rock fail slow" and "fail soundtrack" error, "cinematic calm" works
        let SearchOutcome::Found(tracks) = searcher.search_for_beat(1, &beat, &HashSet::new()).await
        else {
            panic!("expected tracks");
        };
        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.id.starts_with("cinematic-")));
        assert_eq!(catalog.queries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn all_queries_failing_is_failed() {
        let searcher = TrackSearcher::new(
            StubCatalog::failing(),
            QueryStrategy::DEFAULT_ORDER.to_vec(),
            8,
            5,
        );

        match searcher.search_for_beat(0, &beat(), &HashSet::new()).await {
            SearchOutcome::Failed { attempts, last_error } => {
                assert!(attempts >= 4);
                assert!(last_error.contains("refused"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_results_are_found_not_failed() {
        let searcher = TrackSearcher::new(
            StubCatalog::new(0),
            QueryStrategy::DEFAULT_ORDER.to_vec(),
            8,
            5,
        );
        assert!(matches!(
            searcher.search_for_beat(0, &beat(), &HashSet::new()).await,
            SearchOutcome::Found(tracks) if tracks.is_empty()
        ));
    }
}
