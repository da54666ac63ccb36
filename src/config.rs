//! Configuration management for the agent service.
//!
//! Configuration can be set via environment variables:
//! - `GOOGLE_API_KEY` - Required. Google Custom Search API key.
//! - `GOOGLE_CSE_ID` - Required. Google Custom Search engine identifier.
//! - `VLLM_BASE_URL` - Optional. Base URL of the OpenAI-compatible completion
//!   server. Defaults to `http://127.0.0.1:8001`.
//! - `MODEL_ID` - Optional. Model identifier passed to the completion backend.
//!   Defaults to `Qwen/Qwen3-4B-Instruct-2507`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_TOKENS` - Optional. Completion budget per reasoning step. Defaults to `512`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Wall-clock budget per request. Defaults to `300`.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Custom Search API key
    pub google_api_key: String,

    /// Google Custom Search engine identifier
    pub google_cse_id: String,

    /// Base URL of the OpenAI-compatible completion server
    pub vllm_base_url: String,

    /// Model identifier passed to the completion backend
    pub model_id: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Completion budget per reasoning step
    pub max_tokens: u32,

    /// Wall-clock budget for one request
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GOOGLE_API_KEY` or
    /// `GOOGLE_CSE_ID` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let google_api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_API_KEY".to_string()))?;

        let google_cse_id = std::env::var("GOOGLE_CSE_ID")
            .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_CSE_ID".to_string()))?;

        let vllm_base_url = std::env::var("VLLM_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8001".to_string());

        let model_id = std::env::var("MODEL_ID")
            .unwrap_or_else(|_| "Qwen/Qwen3-4B-Instruct-2507".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_tokens = std::env::var("MAX_TOKENS")
            .unwrap_or_else(|_| "512".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MAX_TOKENS".to_string(), format!("{}", e)))?;

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            google_api_key,
            google_cse_id,
            vllm_base_url,
            model_id,
            host,
            port,
            max_tokens,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(google_api_key: String, google_cse_id: String) -> Self {
        Self {
            google_api_key,
            google_cse_id,
            vllm_base_url: "http://127.0.0.1:8001".to_string(),
            model_id: "Qwen/Qwen3-4B-Instruct-2507".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_tokens: 512,
            request_timeout: Duration::from_secs(300),
        }
    }
}
