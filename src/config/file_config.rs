use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,

    // Feature configs
    pub server: Option<ServerConfig>,
    pub llm: Option<LlmConfig>,
    pub catalog: Option<CatalogConfig>,
    pub enrichment: Option<EnrichmentConfig>,
    pub pipeline: Option<PipelineConfig>,
    pub scoring: Option<ScoringConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Value of Access-Control-Allow-Origin; "*" allows any origin
    pub allowed_origin: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    /// Ask for a JSON object response
    pub json_mode: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_base_url: Option<String>,
    pub token_url: Option<String>,
    pub market: Option<String>,
    pub results_per_query: Option<usize>,
    /// Stop escalating query strategies once this many candidates were found
    pub min_results: Option<usize>,
    /// Ordered: "direct", "synonym_expanded", "genre_qualified", "generic_fallback"
    pub strategies: Option<Vec<String>>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub min_request_interval_ms: Option<u64>,
    pub max_tracks_per_request: Option<usize>,
    pub batch_size: Option<usize>,
    pub batch_delay_ms: Option<u64>,
    pub lookup_timeout_secs: Option<u64>,
    pub min_match_similarity: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_beats: Option<usize>,
    pub tracks_per_beat: Option<usize>,
    pub max_tracks: Option<usize>,
    pub time_budget_secs: Option<u64>,
    /// Skip enrichment once less than this much of the budget is left
    pub enrichment_cutoff_secs: Option<u64>,
    pub placeholder_image_url: Option<String>,
    pub include_stats: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    /// Rule name -> weight, e.g. `tempo_fit = 30`
    pub weights: Option<HashMap<String, f64>>,
    pub min_text_score: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
