use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use soundstory_server::agent::llm::{LlmProvider, OpenAIProvider};
use soundstory_server::catalog::{
    ClientCredentialsTokenProvider, SpotifyCatalog, TokenProvider, TrackCatalog,
};
use soundstory_server::config::{self, AppConfig, FileConfig};
use soundstory_server::enrichment::{GetSongBpmClient, TrackEnricher};
use soundstory_server::playlist::PlaylistPipeline;
use soundstory_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// API key for the chat-completion service.
    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
    pub spotify_client_id: Option<String>,

    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub spotify_client_secret: Option<String>,

    /// API key for tempo/key enrichment. Enrichment is off without it.
    #[clap(long, env = "GETSONGBPM_API_KEY", hide_env_values = true)]
    pub getsongbpm_api_key: Option<String>,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            openai_api_key: args.openai_api_key.clone(),
            spotify_client_id: args.spotify_client_id.clone(),
            spotify_client_secret: args.spotify_client_secret.clone(),
            getsongbpm_api_key: args.getsongbpm_api_key.clone(),
        }
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

fn build_pipeline(app_config: &AppConfig) -> Result<PlaylistPipeline> {
    let llm: Arc<dyn LlmProvider> = Arc::new(OpenAIProvider::new(
        app_config.llm.base_url.clone(),
        app_config.llm.model.clone(),
        Some(app_config.llm.api_key.clone()),
    ));
    info!(
        "Using model {} at {}",
        app_config.llm.model, app_config.llm.base_url
    );

    let catalog_client = http_client(app_config.catalog.request_timeout_secs)?;
    let tokens: Arc<dyn TokenProvider> = Arc::new(ClientCredentialsTokenProvider::new(
        catalog_client.clone(),
        app_config.catalog.token_url.clone(),
        app_config.catalog.client_id.clone(),
        app_config.catalog.client_secret.clone(),
    ));
    let catalog: Arc<dyn TrackCatalog> = Arc::new(SpotifyCatalog::new(
        catalog_client,
        app_config.catalog.api_base_url.clone(),
        app_config.catalog.market.clone(),
        tokens,
    ));

    let enrichment = &app_config.enrichment;
    let enricher: Option<Arc<dyn TrackEnricher>> = match (&enrichment.api_key, enrichment.enabled) {
        (Some(api_key), true) => {
            info!("Track enrichment enabled via {}", enrichment.base_url);
            let client: Arc<dyn TrackEnricher> = Arc::new(GetSongBpmClient::new(
                http_client(enrichment.lookup_timeout_secs)?,
                enrichment.base_url.clone(),
                api_key.clone(),
                Duration::from_millis(enrichment.min_request_interval_ms),
                enrichment.min_match_similarity,
            ));
            Some(client)
        }
        _ => {
            info!("Track enrichment disabled");
            None
        }
    };

    Ok(PlaylistPipeline::from_config(
        app_config, llm, catalog, enricher,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let cli_config = config::CliConfig::from(&cli_args);
    let app_config =
        AppConfig::resolve(&cli_config, file_config).context("Invalid configuration")?;

    metrics::init_metrics();

    let pipeline = build_pipeline(&app_config)?;
    info!(
        "Pipeline ready: up to {} beats, {} tracks per beat, {} tracks total, enrichment {}",
        app_config.pipeline.max_beats,
        app_config.pipeline.tracks_per_beat,
        app_config.pipeline.max_tracks,
        if pipeline.enrichment_enabled() { "on" } else { "off" }
    );

    run_server(ServerConfig::from(&app_config), Arc::new(pipeline)).await
}
