use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use crate::error::{AppError, Result};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub openai_api_key: String,
    /// Base URL of the completions provider, without a trailing slash.
    pub openai_api_base: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, `load` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // The provider credential is required before the server accepts anything
        let openai_api_key = lookup("OPENAI_API_KEY")
            .ok_or_else(|| AppError::ConfigError("OPENAI_API_KEY is not set".to_string()))?;
        if openai_api_key.trim().is_empty() {
            return Err(AppError::ConfigError("OPENAI_API_KEY is empty".to_string()));
        }

        let openai_api_base = lookup("OPENAI_API_BASE")
            .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        // Load server configuration with defaults
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("PORT").unwrap_or_else(|| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let server_addr = SocketAddr::new(ip, port);

        Ok(Config {
            server_addr,
            openai_api_key,
            openai_api_base,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/completions", self.openai_api_base)
    }
}
