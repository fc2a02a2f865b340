//! Track enricher trait definition.

use super::models::TrackEnrichment;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EnrichmentError::Timeout
        } else if e.is_decode() {
            EnrichmentError::InvalidResponse(e.to_string())
        } else {
            EnrichmentError::Connection(e.to_string())
        }
    }
}

/// Looks up audio attributes for a track by artist and title.
#[async_trait]
pub trait TrackEnricher: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the service has no confident match.
    async fn lookup(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<TrackEnrichment>, EnrichmentError>;
}
