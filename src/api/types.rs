//! API request and response types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{LoopConfig, LoopResult, Step, TerminatedBy};

/// Upper bound accepted for the sampling temperature.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Request to run the agent on a question.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// The user's question
    pub prompt: String,

    /// Maximum reasoning iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling parameter
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_max_iterations() -> u32 {
    5
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

/// Rejected before any model call is made.
#[derive(Debug, Error)]
pub enum InvalidRequestError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("max_iterations must be at least 1")]
    MaxIterations,

    #[error("temperature must be in (0, {max}]", max = MAX_TEMPERATURE)]
    Temperature,

    #[error("top_p must be in [0, 1]")]
    TopP,
}

impl GenerateRequest {
    /// Check bounds and produce the loop configuration. Out-of-range values
    /// are rejected, never clamped.
    pub fn validate(&self) -> Result<LoopConfig, InvalidRequestError> {
        if self.prompt.trim().is_empty() {
            return Err(InvalidRequestError::EmptyPrompt);
        }
        if self.max_iterations < 1 {
            return Err(InvalidRequestError::MaxIterations);
        }
        if !(self.temperature > 0.0 && self.temperature <= MAX_TEMPERATURE) {
            return Err(InvalidRequestError::Temperature);
        }
        if !(self.top_p >= 0.0 && self.top_p <= 1.0) {
            return Err(InvalidRequestError::TopP);
        }
        Ok(LoopConfig {
            max_iterations: self.max_iterations,
            temperature: self.temperature,
            top_p: self.top_p,
        })
    }
}

/// Successful agent run.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub prompt: String,
    pub final_answer: String,
    pub reasoning_steps: Vec<Step>,
    pub tool_calls: usize,
}

impl GenerateResponse {
    pub fn new(prompt: String, result: LoopResult) -> Self {
        Self {
            prompt,
            final_answer: result.final_answer,
            reasoning_steps: result.steps,
            tool_calls: result.tool_calls,
        }
    }
}

/// Error body returned for fatal failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error kind, snake_case
    pub error: &'static str,

    /// Human-readable message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminated_by: Option<TerminatedBy>,

    /// Partial transcript built before the failure, if any
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasoning_steps: Vec<Step>,

    pub tool_calls: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Configured model identifier
    pub model: String,

    /// Registered tool names
    pub tools: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> GenerateRequest {
        serde_json::from_str(json).expect("deserialize")
    }

    #[test]
    fn defaults_applied_when_fields_omitted() {
        let req = request(r#"{"prompt": "hi"}"#);
        assert_eq!(req.max_iterations, 5);
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.top_p, 0.9);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_empty_prompt() {
        let req = request(r#"{"prompt": "   "}"#);
        assert!(matches!(
            req.validate(),
            Err(InvalidRequestError::EmptyPrompt)
        ));
    }

    #[test]
    fn rejects_zero_iterations() {
        let req = request(r#"{"prompt": "hi", "max_iterations": 0}"#);
        assert!(matches!(
            req.validate(),
            Err(InvalidRequestError::MaxIterations)
        ));
    }

    #[test]
    fn rejects_out_of_range_top_p() {
        let req = request(r#"{"prompt": "hi", "top_p": 1.5}"#);
        assert!(matches!(req.validate(), Err(InvalidRequestError::TopP)));
    }

    #[test]
    fn rejects_non_positive_temperature() {
        let req = request(r#"{"prompt": "hi", "temperature": 0.0}"#);
        assert!(matches!(
            req.validate(),
            Err(InvalidRequestError::Temperature)
        ));
    }

    #[test]
    fn validate_produces_loop_config() {
        let req =
            request(r#"{"prompt": "hi", "max_iterations": 7, "temperature": 1.1, "top_p": 1.0}"#);
        let config = req.validate().expect("valid");
        assert_eq!(config.max_iterations, 7);
        assert_eq!(config.temperature, 1.1);
        assert_eq!(config.top_p, 1.0);
    }

    #[test]
    fn terminated_by_serializes_snake_case() {
        let value = serde_json::to_value(TerminatedBy::IterationLimit).expect("serialize");
        assert_eq!(value, serde_json::json!("iteration_limit"));
    }
}
