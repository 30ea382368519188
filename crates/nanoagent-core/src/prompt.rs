//! Prompt rendering.
//!
//! Every iteration re-renders the whole prompt from the task, the tool
//! registry and the history so far.  Rendering is pure: identical inputs
//! always produce identical text.

use crate::registry::ToolRegistry;
use crate::step::History;

/// Marker rendered in place of the history on the first iteration.
pub const NO_HISTORY: &str = "No history present, this is the first iteration";

/// Renders agent prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptFormatter;

impl PromptFormatter {
    /// Render the prompt for the next iteration.
    pub fn format(task: &str, registry: &ToolRegistry, history: &History) -> String {
        let tools = registry.list();
        let history = if history.is_empty() {
            NO_HISTORY.to_owned()
        } else {
            history.render()
        };

        format!(
            r#"You are an AI agent tasked with {task}. Use critical reasoning and these tools:

Tools:
{tools}

Respond with a JSON object inside a markdown ```json code block, with these keys:
  "thought": <your internal reasoning>,
  "action": <tool name, or "" when you are not calling a tool>,
  "action_input": <tool arguments as a JSON object>,
  "final_answer": <the final answer once you have it, otherwise "">

History:
{history}

Important: Provide only valid JSON without any introduction, explanation, or additional text. No Preamble."#
        )
    }

    /// Render the corrective prompt sent after a reply that could not be
    /// used.
    pub fn format_retry(original_prompt: &str, previous_response: &str) -> String {
        format!(
            r#"Your previous response was not in the correct JSON format:
{previous_response}

Please provide a valid JSON response as specified in the original prompt:
{original_prompt}"#
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
