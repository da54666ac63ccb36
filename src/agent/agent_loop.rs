//! Core ReAct loop implementation.
//!
//! One `Agent` serves many concurrent requests; each `run` owns its own
//! transcript and never shares state with other runs. Recoverable problems
//! (parse failures, unknown or failing tools) are folded into the transcript
//! as observations so the model can adapt; only inference failures abort a
//! run. The loop issues at most `max_iterations` model calls.

use std::sync::Arc;

use thiserror::Error;

use crate::llm::{CompletionClient, InferenceError, SamplingOptions};
use crate::tools::ToolRegistry;

use super::parser::{self, ParseError, ParsedStep};
use super::prompt::build_prompt;
use super::{LoopConfig, LoopResult, Step, TerminatedBy, OBSERVATION_MARKER};

/// Corrective observation fed back when a completion cannot be parsed.
const FORMAT_REMINDER: &str = "Response format not understood. Reply with exactly the labels `Thought:`, `Action:` and `Action Input:`, each on its own line.";

/// A fatal inference failure, carrying whatever transcript was built before
/// the backend went away.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct LoopError {
    #[source]
    pub source: InferenceError,
    pub steps: Vec<Step>,
    pub tool_calls: usize,
}

/// The reasoning agent.
pub struct Agent {
    llm: Arc<dyn CompletionClient>,
    tools: Arc<ToolRegistry>,
    max_tokens: u32,
}

impl Agent {
    pub fn new(llm: Arc<dyn CompletionClient>, tools: Arc<ToolRegistry>, max_tokens: u32) -> Self {
        Self {
            llm,
            tools,
            max_tokens,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Drive the Thought/Action/Observation loop for one question.
    pub async fn run(
        &self,
        question: &str,
        config: &LoopConfig,
    ) -> Result<LoopResult, LoopError> {
        let mut steps: Vec<Step> = Vec::new();
        let mut tool_calls = 0usize;

        let sampling = SamplingOptions {
            max_tokens: self.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            stop: vec![OBSERVATION_MARKER.to_string()],
        };

        for iteration in 1..=config.max_iterations {
            tracing::debug!(iteration, "requesting next reasoning step");

            let prompt = build_prompt(question, &steps, &self.tools);
            let completion = match self.llm.complete(&prompt, &sampling).await {
                Ok(text) => text,
                Err(source) => {
                    tracing::error!(error = %source, iteration, "inference backend failed");
                    return Err(LoopError {
                        source,
                        steps,
                        tool_calls,
                    });
                }
            };

            match parser::parse_step(&completion, &self.tools) {
                Ok(parsed) if parser::is_final_answer(&parsed.action) => {
                    let final_answer = if parsed.action_input.is_empty() {
                        best_effort_answer(&steps)
                    } else {
                        parsed.action_input.clone()
                    };
                    steps.push(Step {
                        thought: parsed.thought,
                        action: parsed.action,
                        action_input: parsed.action_input,
                        observation: Some("Task completed".to_string()),
                    });
                    return Ok(LoopResult {
                        final_answer,
                        steps,
                        tool_calls,
                        terminated_by: TerminatedBy::FinalAnswer,
                    });
                }
                Ok(parsed) => {
                    let observation = self.execute_tool(&parsed, &mut tool_calls).await;
                    steps.push(Step {
                        thought: parsed.thought,
                        action: parsed.action,
                        action_input: parsed.action_input,
                        observation: Some(observation),
                    });
                }
                Err(ParseError::UnknownAction { action, step }) => {
                    tracing::warn!(action = action.as_str(), "model chose an unregistered action");
                    let observation = format!(
                        "The tool `{}` does not exist. Available tools: {}. Use one of those, or `Final Answer` to finish.",
                        action,
                        self.tools.names().join(", ")
                    );
                    steps.push(Step {
                        thought: step.thought,
                        action: step.action,
                        action_input: step.action_input,
                        observation: Some(observation),
                    });
                }
                Err(ParseError::MissingAction) => {
                    tracing::warn!(iteration, "completion had no parsable action");
                    steps.push(Step {
                        thought: completion.trim().to_string(),
                        action: String::new(),
                        action_input: String::new(),
                        observation: Some(FORMAT_REMINDER.to_string()),
                    });
                }
            }
        }

        let final_answer = best_effort_answer(&steps);
        Ok(LoopResult {
            final_answer,
            steps,
            tool_calls,
            terminated_by: TerminatedBy::IterationLimit,
        })
    }

    /// Invoke the tool named by a parsed step. Failures become the
    /// observation so the loop keeps going.
    async fn execute_tool(&self, parsed: &ParsedStep, tool_calls: &mut usize) -> String {
        match self.tools.lookup(&parsed.action) {
            Ok(tool) => {
                *tool_calls += 1;
                tracing::info!(
                    tool = parsed.action.as_str(),
                    call = *tool_calls,
                    "invoking tool"
                );
                match tool.invoke(&parsed.action_input).await {
                    Ok(output) => output,
                    Err(err) => {
                        tracing::warn!(tool = parsed.action.as_str(), error = %err, "tool failed");
                        format!("Error: {}", err)
                    }
                }
            }
            Err(err) => format!(
                "{}. Available tools: {}.",
                err,
                self.tools.names().join(", ")
            ),
        }
    }
}

/// Synthesized answer for runs that end without `Final Answer`. Prefers the
/// most recent tool observation over corrective ones.
fn best_effort_answer(steps: &[Step]) -> String {
    let last_tool_observation = steps
        .iter()
        .rev()
        .filter(|s| !s.action.is_empty())
        .find_map(|s| s.observation.as_deref().filter(|o| !o.is_empty()));

    match last_tool_observation {
        Some(observation) => format!(
            "I could not complete the reasoning within the iteration limit. The most recent finding was: {}",
            truncate_for_answer(observation, 2000)
        ),
        None => {
            "I could not complete the reasoning process within the iteration limit.".to_string()
        }
    }
}

/// Truncate at a char boundary at or below `max` bytes.
fn truncate_for_answer(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut idx = max;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    format!("{}... [truncated]", &s[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Completion client that replays a fixed script.
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, InferenceError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            _prompt: &str,
            _options: &SamplingOptions,
        ) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Ok("I have nothing more to say".to_string()))
        }
    }

    #[derive(Debug)]
    struct EchoSearch;

    #[async_trait]
    impl Tool for EchoSearch {
        fn name(&self) -> &str {
            "Search"
        }

        fn description(&self) -> &str {
            "echoes the query"
        }

        async fn invoke(&self, input: &str) -> Result<String, ToolError> {
            Ok(format!("results for {}", input))
        }
    }

    #[derive(Debug)]
    struct FailingSearch;

    #[async_trait]
    impl Tool for FailingSearch {
        fn name(&self) -> &str {
            "Search"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        async fn invoke(&self, _input: &str) -> Result<String, ToolError> {
            Err(ToolError::Failed {
                tool: "Search".to_string(),
                message: "rate limited".to_string(),
            })
        }
    }

    fn registry_with(tool: Arc<dyn Tool>) -> Arc<ToolRegistry> {
        let mut tools = ToolRegistry::new();
        tools.register(tool).expect("register");
        Arc::new(tools)
    }

    fn config(max_iterations: u32) -> LoopConfig {
        LoopConfig {
            max_iterations,
            temperature: 0.7,
            top_p: 0.9,
        }
    }

    fn search_step(query: &str) -> String {
        format!("Thought: need to look this up\nAction: Search\nAction Input: {query}")
    }

    fn final_step(answer: &str) -> String {
        format!("Thought: I now know the final answer\nAction: Final Answer\nAction Input: {answer}")
    }

    #[tokio::test]
    async fn final_answer_short_circuits() {
        let client = ScriptedClient::new(vec![Ok(final_step("42"))]);
        let agent = Agent::new(client.clone(), registry_with(Arc::new(EchoSearch)), 512);

        let result = agent.run("meaning of life?", &config(5)).await.expect("run");

        assert_eq!(result.final_answer, "42");
        assert_eq!(result.terminated_by, TerminatedBy::FinalAnswer);
        assert_eq!(result.tool_calls, 0);
        assert_eq!(result.steps.len(), 1);
        assert_eq!(result.steps[0].observation.as_deref(), Some("Task completed"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn tool_calls_are_counted() {
        let client = ScriptedClient::new(vec![
            Ok(search_step("first query")),
            Ok(search_step("second query")),
            Ok(final_step("done")),
        ]);
        let agent = Agent::new(client.clone(), registry_with(Arc::new(EchoSearch)), 512);

        let result = agent.run("question", &config(5)).await.expect("run");

        assert_eq!(result.tool_calls, 2);
        assert_eq!(result.terminated_by, TerminatedBy::FinalAnswer);
        assert_eq!(
            result.steps[0].observation.as_deref(),
            Some("results for first query")
        );
        assert_eq!(
            result.steps[1].observation.as_deref(),
            Some("results for second query")
        );
    }

    #[tokio::test]
    async fn unknown_action_recovers_and_continues() {
        let client = ScriptedClient::new(vec![
            Ok("Thought: math\nAction: Calculator\nAction Input: 2+2".to_string()),
            Ok(final_step("4")),
        ]);
        let agent = Agent::new(client.clone(), registry_with(Arc::new(EchoSearch)), 512);

        let result = agent.run("what is 2+2?", &config(5)).await.expect("run");

        let observation = result.steps[0].observation.as_deref().expect("observation");
        assert!(observation.contains("does not exist"));
        assert!(observation.contains("Search"));
        assert_eq!(result.tool_calls, 0);
        assert_eq!(result.terminated_by, TerminatedBy::FinalAnswer);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn unparsable_completions_still_terminate() {
        let client = ScriptedClient::new(vec![
            Ok("complete gibberish".to_string()),
            Ok("more gibberish".to_string()),
            Ok("still gibberish".to_string()),
        ]);
        let agent = Agent::new(client.clone(), registry_with(Arc::new(EchoSearch)), 512);

        let result = agent.run("question", &config(3)).await.expect("run");

        assert_eq!(result.terminated_by, TerminatedBy::IterationLimit);
        assert_eq!(result.steps.len(), 3);
        assert_eq!(client.calls(), 3);
        assert!(!result.final_answer.is_empty());
        for step in &result.steps {
            assert_eq!(step.observation.as_deref(), Some(FORMAT_REMINDER));
        }
    }

    #[tokio::test]
    async fn tool_failure_keeps_loop_alive() {
        let client = ScriptedClient::new(vec![
            Ok(search_step("anything")),
            Ok(final_step("gave up on search")),
        ]);
        let agent = Agent::new(client.clone(), registry_with(Arc::new(FailingSearch)), 512);

        let result = agent.run("question", &config(5)).await.expect("run");

        let observation = result.steps[0].observation.as_deref().expect("observation");
        assert!(observation.starts_with("Error:"));
        assert!(observation.contains("rate limited"));
        assert_eq!(result.tool_calls, 1);
        assert_eq!(result.terminated_by, TerminatedBy::FinalAnswer);
    }

    #[tokio::test]
    async fn inference_failure_returns_partial_transcript() {
        let client = ScriptedClient::new(vec![
            Ok(search_step("query")),
            Err(InferenceError::Backend {
                status: 503,
                message: "overloaded".to_string(),
            }),
        ]);
        let agent = Agent::new(client.clone(), registry_with(Arc::new(EchoSearch)), 512);

        let err = agent
            .run("question", &config(5))
            .await
            .expect_err("must fail");

        assert_eq!(err.steps.len(), 1);
        assert_eq!(err.tool_calls, 1);
        assert!(matches!(
            err.source,
            InferenceError::Backend { status: 503, .. }
        ));
    }

    #[tokio::test]
    async fn iteration_limit_answer_draws_on_last_tool_observation() {
        let client = ScriptedClient::new(vec![
            Ok(search_step("rust release date")),
            Ok("gibberish".to_string()),
        ]);
        let agent = Agent::new(client.clone(), registry_with(Arc::new(EchoSearch)), 512);

        let result = agent.run("question", &config(2)).await.expect("run");

        assert_eq!(result.terminated_by, TerminatedBy::IterationLimit);
        assert!(result
            .final_answer
            .contains("results for rust release date"));
    }

    #[tokio::test]
    async fn empty_final_answer_falls_back_to_transcript() {
        let client = ScriptedClient::new(vec![
            Ok(search_step("rust facts")),
            Ok("Thought: done\nAction: Final Answer".to_string()),
        ]);
        let agent = Agent::new(client.clone(), registry_with(Arc::new(EchoSearch)), 512);

        let result = agent.run("question", &config(5)).await.expect("run");

        assert_eq!(result.terminated_by, TerminatedBy::FinalAnswer);
        assert!(!result.final_answer.is_empty());
        assert!(result.final_answer.contains("results for rust facts"));
    }
}
