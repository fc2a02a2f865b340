//! Bearer tokens for the catalog API (client-credentials grant).

use super::error::CatalogError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens are treated as expired this long before the reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Source of bearer tokens for catalog requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A currently valid token, refreshed if needed.
    async fn access_token(&self) -> Result<String, CatalogError>;

    /// Drop any cached token so the next call refreshes.
    async fn invalidate(&self) {}
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn new(value: String, expires_in: Duration, now: Instant) -> Self {
        Self {
            value,
            expires_at: now + expires_in.saturating_sub(EXPIRY_MARGIN),
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Client-credentials token provider with an in-memory cache.
///
/// Concurrent callers seeing an expired token may refresh at the same time;
/// the last write wins and every written token is valid.
pub struct ClientCredentialsTokenProvider {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ClientCredentialsTokenProvider {
    pub fn new(
        client: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: RwLock::new(None),
        }
    }

    fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64.encode(credentials))
    }

    /// Fetch a new token and store it.
    pub async fn refresh(&self) -> Result<String, CatalogError> {
        debug!(token_url = %self.token_url, "Requesting catalog access token");

        let response = self
            .client
            .post(&self.token_url)
            .header("Authorization", self.basic_auth())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Auth(format!("invalid token response: {}", e)))?;

        let token = CachedToken::new(
            body.access_token,
            Duration::from_secs(body.expires_in),
            Instant::now(),
        );
        let value = token.value.clone();
        *self.cached.write().await = Some(token);

        info!(expires_in_secs = body.expires_in, "Obtained catalog access token");
        Ok(value)
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsTokenProvider {
    async fn access_token(&self) -> Result<String, CatalogError> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if token.is_fresh(Instant::now()) {
                    return Ok(token.value.clone());
                }
            }
        }
        self.refresh().await
    }

    async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

/// Fixed token, for services that hand out long-lived keys and for tests.
pub struct StaticTokenProvider(pub String);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, CatalogError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn cached_token_honours_margin() {
        let now = Instant::now();
        let token = CachedToken::new("abc".to_string(), Duration::from_secs(3600), now);
        assert!(token.is_fresh(now + Duration::from_secs(3500)));
        assert!(!token.is_fresh(now + Duration::from_secs(3541)));

        // expiry shorter than the margin is immediately stale
        let short = CachedToken::new("abc".to_string(), Duration::from_secs(30), now);
        assert!(!short.is_fresh(now));
    }

    #[test]
    fn basic_auth_header() {
        let provider =
            ClientCredentialsTokenProvider::new(Client::new(), DEFAULT_TOKEN_URL, "id", "secret");
        // base64("id:secret")
        assert_eq!(provider.basic_auth(), "Basic aWQ6c2VjcmV0");
    }

    async fn spawn_token_server(hits: Arc<AtomicUsize>, expires_in: u64) -> String {
        let app = Router::new().route(
            "/api/token",
            post(move |body: String| {
                let hits = hits.clone();
                async move {
                    assert_eq!(body, "grant_type=client_credentials");
                    let n = hits.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({
                        "access_token": format!("token-{}", n),
                        "token_type": "Bearer",
                        "expires_in": expires_in,
                    }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/token", addr)
    }

    #[tokio::test]
    async fn token_is_cached_until_expiry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_token_server(hits.clone(), 3600).await;
        let provider = ClientCredentialsTokenProvider::new(Client::new(), url, "id", "secret");

        assert_eq!(provider.access_token().await.unwrap(), "token-0");
        assert_eq!(provider.access_token().await.unwrap(), "token-0");
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        provider.invalidate().await;
        assert_eq!(provider.access_token().await.unwrap(), "token-1");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn short_lived_token_is_refreshed_every_time() {
        let hits = Arc::new(AtomicUsize::new(0));
        let url = spawn_token_server(hits.clone(), 10).await;
        let provider = ClientCredentialsTokenProvider::new(Client::new(), url, "id", "secret");

        provider.access_token().await.unwrap();
        provider.access_token().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_token_endpoint_is_connection_error() {
        let provider = ClientCredentialsTokenProvider::new(
            Client::new(),
            "http://127.0.0.1:9/api/token",
            "id",
            "secret",
        );
        let result = provider.access_token().await;
        assert!(matches!(result, Err(CatalogError::Connection(_))));
    }
}
