//! Optional audio-attribute enrichment (tempo, key, energy) of catalog
//! tracks from a secondary service.

mod batch;
mod getsongbpm;
mod matching;
mod models;
mod provider;

pub use batch::{enrich_candidates, BatchSettings, EnrichmentBudget, EnrichmentReport};
pub use getsongbpm::{GetSongBpmClient, DEFAULT_BASE_URL};
pub use matching::{match_similarity, normalize_for_match};
pub use models::TrackEnrichment;
pub use provider::{EnrichmentError, TrackEnricher};
