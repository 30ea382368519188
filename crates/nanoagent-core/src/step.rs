//! Per-iteration records and the run history.
//!
//! A [`Step`] is created as soon as the model's reasoning for an iteration
//! is known, appended to the [`History`] immediately, and then completed at
//! most once with the chosen action and once with the resulting
//! observation.  The history is append-only: steps are never reordered or
//! removed, and its rendering is fed verbatim into every later prompt.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tool::ToolArgs;

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One iteration's reasoning, optional action and optional observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// One-based position in the run.
    pub index: u32,

    /// The model's reasoning for this iteration.
    pub thought: String,

    /// Name of the tool the model selected, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Arguments the tool was called with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_input: Option<ToolArgs>,

    /// What came back from the tool (or why it could not run).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
}

impl Step {
    /// Start a step with only its reasoning populated.
    pub fn new(index: u32, thought: impl Into<String>) -> Self {
        Self {
            index,
            thought: thought.into(),
            action: None,
            action_input: None,
            observation: None,
        }
    }

    /// Attach the selected action and its arguments.
    pub fn set_action(&mut self, action: impl Into<String>, input: ToolArgs) {
        self.action = Some(action.into());
        self.action_input = Some(input);
    }

    /// Attach the observation produced by the action.
    pub fn set_observation(&mut self, observation: impl Into<String>) {
        self.observation = Some(observation.into());
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\n--- Iteration:{} ---\nthought: {}\n",
            self.index, self.thought
        )?;

        if let Some(action) = self.action.as_deref().filter(|a| !a.is_empty()) {
            writeln!(f, "action: {action}")?;
        }
        if let Some(input) = self.action_input.as_ref().filter(|i| !i.is_empty()) {
            writeln!(f, "action_input: {}", serde_json::Value::Object(input.clone()))?;
        }
        if let Some(obs) = self.observation.as_deref().filter(|o| !o.is_empty()) {
            writeln!(f, "observation: {obs}")?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Ordered, append-only audit trail of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    steps: Vec<Step>,
}

impl History {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Mutable access to the most recent step, used to complete it with its
    /// action and observation.
    pub(crate) fn last_mut(&mut self) -> Option<&mut Step> {
        self.steps.last_mut()
    }

    /// The most recent step.
    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// The step at zero-based `position`.
    pub fn get(&self, position: usize) -> Option<&Step> {
        self.steps.get(position)
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterate over steps in the order they were recorded.
    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// All steps as a slice.
    pub fn as_slice(&self) -> &[Step] {
        &self.steps
    }

    /// Consume the history, returning its steps.
    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Concatenated rendering of every step, as injected into prompts.
    pub fn render(&self) -> String {
        self.steps.iter().map(|s| s.to_string()).collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
