//! Tool definitions and registry.
//!
//! Tools are text-in/text-out capabilities the agent may invoke by name.
//! The registry is built once at startup and shared read-only across
//! requests; registration order is the order tools are shown to the model.

mod web;

pub use web::WebSearch;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Reserved terminal action name. Ends the loop instead of invoking a tool,
/// and can never be registered.
pub const FINAL_ANSWER: &str = "Final Answer";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    Unknown(String),

    #[error("duplicate or reserved tool name `{0}`")]
    Duplicate(String),

    #[error("tool `{tool}` failed: {message}")]
    Failed { tool: String, message: String },
}

/// A named capability the agent can invoke with free-text input.
#[async_trait]
pub trait Tool: Send + Sync + std::fmt::Debug {
    /// Unique tool name, as presented to the model.
    fn name(&self) -> &str;

    /// One-paragraph description used in prompt construction.
    fn description(&self) -> &str;

    /// Invoke the tool. The returned string becomes the observation.
    async fn invoke(&self, input: &str) -> Result<String, ToolError>;
}

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Fails if the name is already taken or reserved.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name();
        if name == FINAL_ANSWER || self.contains(name) {
            return Err(ToolError::Duplicate(name.to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<&dyn Tool, ToolError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Render "name: description" lines in registration order, for prompt
    /// construction.
    pub fn describe_all(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
