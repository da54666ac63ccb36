//! Extraction of Thought/Action/Action Input triples from raw completions.
//!
//! The model's output is untrusted free text: the parser is permissive about
//! formatting (padding, multi-line fields, a missing thought) but strict
//! about the action vocabulary, since the action string drives control flow.

use thiserror::Error;

use crate::tools::ToolRegistry;

use super::OBSERVATION_MARKER;

const THOUGHT_LABEL: &str = "Thought:";
const ACTION_LABEL: &str = "Action:";
const ACTION_INPUT_LABEL: &str = "Action Input:";

/// A parsed, not-yet-executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStep {
    pub thought: String,
    pub action: String,
    pub action_input: String,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no recognizable `Action:` line in model output")]
    MissingAction,

    /// The action names neither a registered tool nor the terminal marker.
    /// Carries the parsed fields so the loop can fold them into the
    /// transcript.
    #[error("unknown action `{action}`")]
    UnknownAction { action: String, step: ParsedStep },
}

/// Extract the next step from one raw completion.
///
/// Labels are matched case-sensitively in order: the first `Thought:`, the
/// first `Action:` after it, the first `Action Input:` after that. Each field
/// runs to the next recognized label or end of text, trimmed. A missing
/// thought yields an empty string; a missing action is an error.
pub fn parse_step(text: &str, tools: &ToolRegistry) -> Result<ParsedStep, ParseError> {
    let (thought, action_search_from) = match text.find(THOUGHT_LABEL) {
        Some(pos) => {
            let body = pos + THOUGHT_LABEL.len();
            let end = next_label(text, body, &[ACTION_LABEL]);
            (text[body..end].trim().to_string(), body)
        }
        None => (String::new(), 0),
    };

    let action_pos = text[action_search_from..]
        .find(ACTION_LABEL)
        .map(|i| action_search_from + i)
        .ok_or(ParseError::MissingAction)?;
    let action_body = action_pos + ACTION_LABEL.len();
    let action_end = next_label(
        text,
        action_body,
        &[ACTION_INPUT_LABEL, OBSERVATION_MARKER, THOUGHT_LABEL],
    );
    let action = text[action_body..action_end].trim().to_string();

    if action.is_empty() {
        return Err(ParseError::MissingAction);
    }

    let action_input = match text[action_body..].find(ACTION_INPUT_LABEL) {
        Some(i) => {
            let body = action_body + i + ACTION_INPUT_LABEL.len();
            let end = next_label(text, body, &[OBSERVATION_MARKER, THOUGHT_LABEL]);
            text[body..end].trim().to_string()
        }
        None => String::new(),
    };

    let step = ParsedStep {
        thought,
        action,
        action_input,
    };

    if is_final_answer(&step.action) || tools.contains(&step.action) {
        Ok(step)
    } else {
        Err(ParseError::UnknownAction {
            action: step.action.clone(),
            step,
        })
    }
}

/// Whether an action string means the terminal marker. Matching is lenient
/// ("Final Answer", "final answer.", ...) since models vary the casing.
pub(crate) fn is_final_answer(action: &str) -> bool {
    action.to_ascii_lowercase().contains("final answer")
}

/// Position of the first of `labels` at or after `from`, or end of text.
fn next_label(text: &str, from: usize, labels: &[&str]) -> usize {
    labels
        .iter()
        .filter_map(|label| text[from..].find(label).map(|i| from + i))
        .min()
        .unwrap_or(text.len())
}
