//! Model reply parsing.
//!
//! The model is asked to answer with a JSON object inside a fenced
//! ```` ```json ```` block.  [`ResponseParser`] pulls that object out of the
//! surrounding prose and turns it into a [`ParsedResponse`].  Anything it
//! cannot read becomes a fallback decision that carries the raw text as its
//! thought and nothing else, which the agent treats as invalid and retries.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AgentError, Result};
use crate::tool::ToolArgs;

/// Matches a `<think>...</think>` span, across lines, non-greedy.
static THINK_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<think>.*?</think>").expect("think-span pattern is valid")
});

// ---------------------------------------------------------------------------
// Parsed response
// ---------------------------------------------------------------------------

/// The structured decision extracted from one model reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResponse {
    /// The model's reasoning.
    pub thought: String,

    /// Tool to invoke; empty when the model is not calling a tool.
    pub action: String,

    /// Arguments for `action`, either an object or a string-encoded object.
    pub action_input: Value,

    /// Terminal answer; empty until the run should end.
    pub final_answer: String,
}

impl ParsedResponse {
    /// The decision used when a reply cannot be parsed: the whole reply as
    /// the thought, no action, no final answer.
    pub fn fallback(raw: &str) -> Self {
        Self {
            thought: raw.to_owned(),
            ..Self::default()
        }
    }

    /// Whether the decision selects a tool.
    pub fn has_action(&self) -> bool {
        !self.action.trim().is_empty()
    }

    /// Whether the decision ends the run.
    pub fn has_final_answer(&self) -> bool {
        !self.final_answer.trim().is_empty()
    }

    /// A decision is usable when it has a thought and either an action or a
    /// final answer.
    pub fn is_valid(&self) -> bool {
        !self.thought.trim().is_empty() && (self.has_action() || self.has_final_answer())
    }

    /// Interpret `action_input` as named arguments.
    ///
    /// Objects are used as-is and strings are decoded as JSON objects.  A
    /// missing, null or blank input means "no arguments".
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidActionInput`] when the input is neither
    /// an object nor a string holding one.
    pub fn arguments(&self) -> Result<ToolArgs> {
        let invalid = |reason: String| AgentError::InvalidActionInput {
            action: self.action.clone(),
            reason,
        };

        match &self.action_input {
            Value::Object(map) => Ok(map.clone()),
            Value::Null => Ok(ToolArgs::new()),
            Value::String(s) if s.trim().is_empty() => Ok(ToolArgs::new()),
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(invalid(format!(
                    "expected a JSON object, got `{other}`"
                ))),
                Err(e) => Err(invalid(format!("malformed JSON `{s}`: {e}"))),
            },
            other => Err(invalid(format!("expected a JSON object, got `{other}`"))),
        }
    }

    /// Build a decision from a JSON object, tolerating missing keys and
    /// non-string scalars.
    fn from_object(map: &Map<String, Value>) -> Self {
        Self {
            thought: text_field(map, "thought"),
            action: text_field(map, "action"),
            action_input: map.get("action_input").cloned().unwrap_or(Value::Null),
            final_answer: text_field(map, "final_answer"),
        }
    }
}

/// Read `key` as text: strings verbatim, null or missing as empty, other
/// values as compact JSON.
fn text_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Extracts structured decisions from raw model output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    /// Parse a reply into a decision.
    ///
    /// Candidates are tried in order: the first ```` ```json ```` block, the
    /// first fenced block of any kind, then the whole trimmed reply.  The
    /// first candidate that decodes to a JSON object wins; if none does the
    /// [fallback](ParsedResponse::fallback) decision is returned.
    pub fn parse(text: &str) -> ParsedResponse {
        let candidates = [json_fence(text), any_fence(text), Some(text.trim())];

        for candidate in candidates.into_iter().flatten() {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
                return ParsedResponse::from_object(&map);
            }
        }

        tracing::debug!(chars = text.len(), "no structured block found in model reply");
        ParsedResponse::fallback(text)
    }
}

/// Remove every `<think>...</think>` span from a reply.
pub fn strip_reasoning(text: &str) -> String {
    THINK_SPAN.replace_all(text, "").into_owned()
}

/// Contents of the first ```` ```json ... ``` ```` block.
fn json_fence(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let end = text[start..].find("```")?;
    Some(text[start..start + end].trim())
}

/// Contents of the first fenced block, minus any language tag.
fn any_fence(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let end = text[start..].find("```")?;
    let body = &text[start..start + end];

    // Drop a leading tag such as `JSON` or `javascript` on the fence line.
    let body = match body.split_once('\n') {
        Some((tag, rest)) if !tag.trim().is_empty() && tag.trim().chars().all(char::is_alphanumeric) => {
            rest
        }
        _ => body,
    };
    Some(body.trim())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
