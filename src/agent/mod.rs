//! ReAct agent core: transcript types, trace parsing, prompt construction
//! and the reasoning loop.

pub mod agent_loop;
pub mod parser;
pub mod prompt;

pub use agent_loop::{Agent, LoopError};

use serde::Serialize;

/// The literal marker that begins an observation line. Generation stops here
/// so the model can never hallucinate its own tool results.
pub const OBSERVATION_MARKER: &str = "Observation:";

/// One executed reasoning step.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub thought: String,
    pub action: String,
    pub action_input: String,
    /// Result of executing the action. `Some` for every executed step,
    /// possibly holding an error message.
    pub observation: Option<String>,
}

/// How a loop run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminatedBy {
    FinalAnswer,
    IterationLimit,
    Error,
}

/// Immutable per-run settings, derived from the validated request.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub max_iterations: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Outcome of one loop run.
#[derive(Debug)]
pub struct LoopResult {
    /// Never empty: on iteration-limit exhaustion a best-effort answer is
    /// synthesized from the transcript.
    pub final_answer: String,
    pub steps: Vec<Step>,
    /// Count of non-terminal tool invocations.
    pub tool_calls: usize,
    pub terminated_by: TerminatedBy,
}
