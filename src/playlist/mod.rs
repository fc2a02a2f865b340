//! Playlist generation for one title.

mod assembler;
mod pipeline;

pub use assembler::{
    EnergyDistribution, PlaylistResponse, PlaylistStats, ResponseAssembler, TrackResponse,
};
pub use pipeline::{EnrichmentStage, PipelineError, PipelineTiming, PlaylistPipeline};
