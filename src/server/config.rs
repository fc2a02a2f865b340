use super::RequestsLoggingLevel;
use crate::config::{AppConfig, DEFAULT_ALLOWED_ORIGIN};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Value of Access-Control-Allow-Origin.
    pub allowed_origin: String,
    /// Upper bound for a whole request, pipeline included.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3000,
            metrics_port: 9091,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            metrics_port: config.metrics_port,
            allowed_origin: config.server.allowed_origin.clone(),
            request_timeout_secs: config.server.request_timeout_secs,
        }
    }
}
