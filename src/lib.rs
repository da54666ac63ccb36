//! # ReAct Agent
//!
//! A minimal ReAct (Reasoning + Acting) agent service with web search.
//!
//! This library provides:
//! - An HTTP API that accepts a question and returns the full reasoning trace
//! - A text-protocol reasoning loop driving an external completion backend
//! - A web search tool backed by Google Custom Search
//!
//! ## Architecture
//!
//! The agent alternates Thought/Action/Observation steps:
//! 1. Receive a question via the API
//! 2. Build a prompt from the instructions, tool list and transcript so far
//! 3. Ask the model for one completion, stopping at the `Observation:` marker
//! 4. Parse the step, execute the chosen tool, append the observation
//! 5. Repeat until the model emits `Final Answer` or the budget runs out
//!
//! ## Example
//!
//! ```rust,ignore
//! use react_agent::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
