//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per endpoint. When routes or request
//! formats change, update only this file.

use super::constants::*;
use reqwest::{Method, Response};
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn playlist_url(&self) -> String {
        format!("{}/generate-playlist", self.base_url)
    }

    /// POST /generate-playlist with `{ "title": title }`
    pub async fn generate_playlist(&self, title: &str) -> Response {
        self.client
            .post(self.playlist_url())
            .json(&json!({ "title": title }))
            .send()
            .await
            .expect("Generate playlist request failed")
    }

    /// POST /generate-playlist with a raw JSON body
    pub async fn generate_playlist_raw(&self, body: &str) -> Response {
        self.client
            .post(self.playlist_url())
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Generate playlist request failed")
    }

    /// Any method on /generate-playlist with an empty body
    pub async fn playlist_with_method(&self, method: Method) -> Response {
        self.client
            .request(method, self.playlist_url())
            .send()
            .await
            .expect("Playlist request failed")
    }

    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }
}
