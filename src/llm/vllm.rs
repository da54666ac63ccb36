//! Completion client for a vLLM server (OpenAI-compatible API).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{CompletionClient, InferenceError, SamplingOptions};

/// Client for the `POST /v1/completions` endpoint of a vLLM server.
pub struct VllmClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

impl VllmClient {
    /// Create a client for the given base URL and model identifier.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            model: model.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for VllmClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &SamplingOptions,
    ) -> Result<String, InferenceError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "top_p": options.top_p,
            "stop": options.stop,
        });

        let response = self
            .http
            .post(format!("{}/v1/completions", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(InferenceError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(InferenceError::EmptyCompletion)?;

        Ok(choice.text.trim().to_string())
    }
}
