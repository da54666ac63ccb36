//! Completion backend interface.
//!
//! The agent treats model inference as an opaque text-in/text-out
//! collaborator behind the [`CompletionClient`] trait; the concrete
//! implementation talks to a vLLM server over its OpenAI-compatible API.

mod vllm;

pub use vllm::VllmClient;

use async_trait::async_trait;
use thiserror::Error;

/// Sampling parameters for one completion request.
#[derive(Debug, Clone)]
pub struct SamplingOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling parameter
    pub top_p: f32,

    /// Stop sequences that halt generation
    pub stop: Vec<String>,
}

/// Errors from the completion backend. Always fatal to the current request:
/// without a completion there is no next reasoning step.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference backend returned status {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("inference backend returned no completion")]
    EmptyCompletion,
}

/// A text completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request one completion for `prompt` with the given sampling options.
    async fn complete(
        &self,
        prompt: &str,
        options: &SamplingOptions,
    ) -> Result<String, InferenceError>;
}
