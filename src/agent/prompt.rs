//! ReAct prompt construction.
//!
//! The prompt is a pure function of the question, transcript and registry:
//! re-rendering the same state always yields identical text.

use crate::tools::{ToolRegistry, FINAL_ANSWER};

use super::{Step, OBSERVATION_MARKER};

/// Render the full prompt for the next completion: fixed instructions, tool
/// descriptions, the transcript so far and a trailing `Thought:` cue.
pub fn build_prompt(question: &str, steps: &[Step], tools: &ToolRegistry) -> String {
    let mut choices = tools.names().join(", ");
    if !choices.is_empty() {
        choices.push_str(", ");
    }
    choices.push_str(FINAL_ANSWER);

    let mut prompt = format!(
        "You are an AI assistant that uses the ReAct (Reasoning + Acting) framework to answer questions.\n\
         \n\
         You have access to the following tools:\n\
         {tools}\n\
         \n\
         Use the following format:\n\
         \n\
         Question: the input question you must answer\n\
         Thought: you should always think about what to do\n\
         Action: the action to take, should be one of [{choices}]\n\
         Action Input: the input to the action\n\
         Observation: the result of the action\n\
         ... (this Thought/Action/Action Input/Observation can repeat N times)\n\
         Thought: I now know the final answer\n\
         Action: Final Answer\n\
         Action Input: the final answer to the original input question\n\
         \n\
         Begin!\n\
         \n\
         Question: {question}\n",
        tools = tools.describe_all(),
        choices = choices,
        question = question,
    );

    for step in steps {
        render_step(&mut prompt, step);
    }
    prompt.push_str("Thought:");
    prompt
}

/// Render one executed step. Malformed turns (no action) render as their raw
/// thought plus the corrective observation, so the model sees the correction.
fn render_step(out: &mut String, step: &Step) {
    out.push_str("Thought: ");
    out.push_str(&step.thought);
    out.push('\n');

    if !step.action.is_empty() {
        out.push_str("Action: ");
        out.push_str(&step.action);
        out.push('\n');
        out.push_str("Action Input: ");
        out.push_str(&step.action_input);
        out.push('\n');
    }

    if let Some(observation) = &step.observation {
        out.push_str(OBSERVATION_MARKER);
        out.push(' ');
        out.push_str(observation);
        out.push('\n');
    }
}
