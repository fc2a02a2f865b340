//! SoundStory Playlist Server Library
//!
//! Turns a film or TV title into a playlist: story beats from an LLM,
//! per-beat catalog searches, optional tempo/key enrichment and a
//! rule-based relevance scorer.

pub mod agent;
pub mod beats;
pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod playlist;
pub mod scoring;
pub mod server;

// Re-export commonly used types for convenience
pub use beats::{Beat, BeatExtractor, EnergyLevel, Tempo};
pub use catalog::{CandidateTrack, SpotifyCatalog, TrackCatalog, TrackSearcher};
pub use enrichment::{GetSongBpmClient, TrackEnricher, TrackEnrichment};
pub use playlist::{PlaylistPipeline, PlaylistResponse};
pub use server::{run_server, RequestsLoggingLevel};
