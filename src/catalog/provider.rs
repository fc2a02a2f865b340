//! Track catalog trait definition.

use super::error::CatalogError;
use super::models::CandidateTrack;
use async_trait::async_trait;

/// A searchable music catalog.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Name of the backing service, used in logs and metrics.
    fn name(&self) -> &str;

    /// Free-text track search returning at most `limit` valid tracks.
    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CandidateTrack>, CatalogError>;
}
