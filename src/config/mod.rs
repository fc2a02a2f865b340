mod file_config;

pub use file_config::{
    CatalogConfig, EnrichmentConfig, FileConfig, LlmConfig, PipelineConfig, ScoringConfig,
    ServerConfig as ServerFileConfig,
};

use crate::agent::llm::CompletionOptions;
use crate::catalog::{QueryStrategy, DEFAULT_API_BASE_URL, DEFAULT_TOKEN_URL};
use crate::enrichment::BatchSettings;
use crate::scoring::{RuleTable, SelectionPolicy};
use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::time::Duration;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://soundstory.webflow.io";
pub const DEFAULT_PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/300x300?text=No+Image";

/// Settings for the text-generation model
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    pub json_mode: bool,
}

impl LlmSettings {
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
            json_response: self.json_mode,
        }
    }
}

/// Settings for the music catalog (search service)
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub api_base_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub market: Option<String>,
    /// Tracks requested per query
    pub results_per_query: usize,
    /// Candidates wanted per beat before query escalation stops
    pub min_results: usize,
    pub strategies: Vec<QueryStrategy>,
    pub request_timeout_secs: u64,
}

/// Settings for the optional enrichment service
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    /// Effective switch: false without an API key
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<String>,
    pub min_request_interval_ms: u64,
    /// Lookup budget for a whole request
    pub max_tracks_per_request: usize,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub lookup_timeout_secs: u64,
    pub min_match_similarity: f64,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: crate::enrichment::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            min_request_interval_ms: 250,
            max_tracks_per_request: 24,
            batch_size: 3,
            batch_delay_ms: 200,
            lookup_timeout_secs: 5,
            min_match_similarity: 0.75,
        }
    }
}

impl EnrichmentSettings {
    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            batch_size: self.batch_size,
            batch_delay: Duration::from_millis(self.batch_delay_ms),
            lookup_timeout: Duration::from_secs(self.lookup_timeout_secs),
        }
    }
}

/// Settings for the per-request pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_beats: usize,
    pub tracks_per_beat: usize,
    pub max_tracks: usize,
    pub time_budget_secs: u64,
    pub enrichment_cutoff_secs: u64,
    pub placeholder_image_url: String,
    pub include_stats: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_beats: 5,
            tracks_per_beat: 3,
            max_tracks: 20,
            time_budget_secs: 25,
            enrichment_cutoff_secs: 8,
            placeholder_image_url: DEFAULT_PLACEHOLDER_IMAGE_URL.to_string(),
            include_stats: true,
        }
    }
}

/// Settings for relevance scoring
#[derive(Debug, Clone, Default)]
pub struct ScoringSettings {
    pub rule_table: RuleTable,
    pub min_text_score: Option<f64>,
}

impl ScoringSettings {
    pub fn selection_policy(&self, per_beat: usize) -> SelectionPolicy {
        SelectionPolicy {
            per_beat,
            min_text_score: self.min_text_score,
        }
    }
}

/// Settings for the HTTP edge
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub allowed_origin: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub openai_api_key: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub getsongbpm_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,

    // Feature configs (with defaults)
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub catalog: CatalogSettings,
    pub enrichment: EnrichmentSettings,
    pub pipeline: PipelineSettings,
    pub scoring: ScoringSettings,
}

/// Treat blank secrets as missing.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present. Credentials only come
    /// from the CLI (or its environment fallbacks).
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        // Server settings
        let server_file = file.server.unwrap_or_default();
        let server_defaults = ServerSettings::default();
        let server = ServerSettings {
            allowed_origin: server_file
                .allowed_origin
                .unwrap_or(server_defaults.allowed_origin),
            request_timeout_secs: server_file
                .request_timeout_secs
                .unwrap_or(server_defaults.request_timeout_secs),
        };

        // LLM settings
        let openai_api_key = present(&cli.openai_api_key).ok_or_else(|| {
            anyhow!("OpenAI API key must be specified via --openai-api-key or OPENAI_API_KEY")
        })?;
        let llm_file = file.llm.unwrap_or_default();
        let llm = LlmSettings {
            base_url: llm_file
                .base_url
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: llm_file.model.unwrap_or_else(|| "gpt-4.1".to_string()),
            api_key: openai_api_key,
            temperature: llm_file.temperature.unwrap_or(0.7),
            max_tokens: llm_file.max_tokens,
            timeout_secs: llm_file.timeout_secs.unwrap_or(20),
            json_mode: llm_file.json_mode.unwrap_or(true),
        };

        // Catalog settings
        let client_id = present(&cli.spotify_client_id).ok_or_else(|| {
            anyhow!("Spotify client id must be specified via --spotify-client-id or SPOTIFY_CLIENT_ID")
        })?;
        let client_secret = present(&cli.spotify_client_secret).ok_or_else(|| {
            anyhow!(
                "Spotify client secret must be specified via --spotify-client-secret or SPOTIFY_CLIENT_SECRET"
            )
        })?;
        let catalog_file = file.catalog.unwrap_or_default();
        let strategies = match catalog_file.strategies {
            Some(names) => parse_strategies(&names)?,
            None => QueryStrategy::DEFAULT_ORDER.to_vec(),
        };
        let catalog = CatalogSettings {
            api_base_url: catalog_file
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            token_url: catalog_file
                .token_url
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            client_id,
            client_secret,
            market: catalog_file.market.filter(|m| !m.trim().is_empty()),
            results_per_query: catalog_file.results_per_query.unwrap_or(5),
            min_results: catalog_file.min_results.unwrap_or(8),
            strategies,
            request_timeout_secs: catalog_file.request_timeout_secs.unwrap_or(10),
        };

        // Enrichment settings - disabled without an API key
        let enrichment_file = file.enrichment.unwrap_or_default();
        let enrichment_defaults = EnrichmentSettings::default();
        let getsongbpm_api_key = present(&cli.getsongbpm_api_key);
        let enrichment = EnrichmentSettings {
            enabled: getsongbpm_api_key.is_some() && enrichment_file.enabled.unwrap_or(true),
            base_url: enrichment_file
                .base_url
                .unwrap_or(enrichment_defaults.base_url),
            api_key: getsongbpm_api_key,
            min_request_interval_ms: enrichment_file
                .min_request_interval_ms
                .unwrap_or(enrichment_defaults.min_request_interval_ms),
            max_tracks_per_request: enrichment_file
                .max_tracks_per_request
                .unwrap_or(enrichment_defaults.max_tracks_per_request),
            batch_size: enrichment_file
                .batch_size
                .unwrap_or(enrichment_defaults.batch_size)
                .max(1),
            batch_delay_ms: enrichment_file
                .batch_delay_ms
                .unwrap_or(enrichment_defaults.batch_delay_ms),
            lookup_timeout_secs: enrichment_file
                .lookup_timeout_secs
                .unwrap_or(enrichment_defaults.lookup_timeout_secs),
            min_match_similarity: enrichment_file
                .min_match_similarity
                .unwrap_or(enrichment_defaults.min_match_similarity)
                .clamp(0.0, 1.0),
        };

        // Pipeline settings
        let pipeline_file = file.pipeline.unwrap_or_default();
        let pipeline_defaults = PipelineSettings::default();
        let pipeline = PipelineSettings {
            max_beats: pipeline_file
                .max_beats
                .unwrap_or(pipeline_defaults.max_beats)
                .max(1),
            tracks_per_beat: pipeline_file
                .tracks_per_beat
                .unwrap_or(pipeline_defaults.tracks_per_beat),
            max_tracks: pipeline_file
                .max_tracks
                .unwrap_or(pipeline_defaults.max_tracks),
            time_budget_secs: pipeline_file
                .time_budget_secs
                .unwrap_or(pipeline_defaults.time_budget_secs),
            enrichment_cutoff_secs: pipeline_file
                .enrichment_cutoff_secs
                .unwrap_or(pipeline_defaults.enrichment_cutoff_secs),
            placeholder_image_url: pipeline_file
                .placeholder_image_url
                .unwrap_or(pipeline_defaults.placeholder_image_url),
            include_stats: pipeline_file
                .include_stats
                .unwrap_or(pipeline_defaults.include_stats),
        };

        // Scoring settings - unknown rule names are an error
        let scoring_file = file.scoring.unwrap_or_default();
        let rule_table = match &scoring_file.weights {
            Some(weights) => RuleTable::with_overrides(weights)?,
            None => RuleTable::default(),
        };
        let scoring = ScoringSettings {
            rule_table,
            min_text_score: scoring_file.min_text_score,
        };

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            server,
            llm,
            catalog,
            enrichment,
            pipeline,
            scoring,
        })
    }
}

fn parse_strategies(names: &[String]) -> Result<Vec<QueryStrategy>> {
    let mut strategies = Vec::new();
    for name in names {
        let strategy = QueryStrategy::from_name(name)
            .ok_or_else(|| anyhow!("Unknown query strategy: {}", name))?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        bail!("catalog.strategies must name at least one query strategy");
    }
    Ok(strategies)
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
