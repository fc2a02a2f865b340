//! Music catalog access: bearer tokens, the Spotify search client, query
//! strategies and the per-beat searcher.

mod error;
mod models;
mod provider;
mod query;
mod searcher;
mod spotify;
mod token;

pub use error::CatalogError;
pub use models::CandidateTrack;
pub use provider::TrackCatalog;
pub use query::QueryStrategy;
pub use searcher::{SearchOutcome, TrackSearcher};
pub use spotify::{SpotifyCatalog, DEFAULT_API_BASE_URL};
pub use token::{
    ClientCredentialsTokenProvider, StaticTokenProvider, TokenProvider, DEFAULT_TOKEN_URL,
};
