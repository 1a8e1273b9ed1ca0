pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod relay;
pub mod render;
pub mod scraper;
pub mod source;

use std::sync::Arc;
use config::Config;
use error::{AppError, Result};

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Shared by the article fetcher and the provider call.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        // Reuse connections; no timeouts beyond the transport's own.
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(config, http))
    }

    pub fn with_client(config: Config, http: reqwest::Client) -> Self {
        AppState {
            config: Arc::new(config),
            http,
        }
    }
}
