//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server wired to stub services.

use super::constants::*;
use super::stubs::{CatalogBehavior, StubCatalog, StubEnricher, StubLlm};
use soundstory_server::catalog::TrackCatalog;
use soundstory_server::config::{AppConfig, CliConfig};
use soundstory_server::enrichment::TrackEnricher;
use soundstory_server::playlist::PlaylistPipeline;
use soundstory_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance backed by stub services
///
/// When dropped, the server gracefully shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    pub llm: Arc<StubLlm>,
    pub catalog: Arc<StubCatalog>,
    pub enricher: Option<Arc<StubEnricher>>,

    // Private fields - keep resources alive until drop
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with a catalog that always has tracks and no enrichment
    pub async fn spawn() -> Self {
        Self::spawn_with(CatalogBehavior::Tracks, false).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if configuration resolution or port binding fails, or if the
    /// server doesn't become ready within timeout.
    pub async fn spawn_with(behavior: CatalogBehavior, with_enrichment: bool) -> Self {
        let cli = CliConfig {
            port: 3000,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::None,
            openai_api_key: Some("test-openai-key".to_string()),
            spotify_client_id: Some("test-client".to_string()),
            spotify_client_secret: Some("test-secret".to_string()),
            getsongbpm_api_key: with_enrichment.then(|| "test-bpm-key".to_string()),
        };
        let mut app_config = AppConfig::resolve(&cli, None).expect("Failed to resolve config");
        // Keep enrichment batches quick
        app_config.enrichment.batch_delay_ms = 0;

        let llm = Arc::new(StubLlm::default());
        let catalog = Arc::new(StubCatalog::new(behavior));
        let enricher = with_enrichment.then(|| Arc::new(StubEnricher::default()));

        let pipeline = PlaylistPipeline::from_config(
            &app_config,
            llm.clone(),
            catalog.clone() as Arc<dyn TrackCatalog>,
            enricher
                .clone()
                .map(|e| e as Arc<dyn TrackEnricher>),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            metrics_port: 0,
            requests_logging_level: RequestsLoggingLevel::None,
            allowed_origin: app_config.server.allowed_origin.clone(),
            request_timeout_secs: app_config.server.request_timeout_secs,
        };
        let app = make_app(config, Arc::new(pipeline));

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            llm,
            catalog,
            enricher,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /health endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/health", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
