//! Agent error types.
//!
//! Every fallible public API of the runtime surfaces errors through
//! [`AgentError`].  Tool handlers report their own failures through
//! [`ToolError`]; those are recovered inside the loop and recorded as
//! observations, so they never escape a run.

use uuid::Uuid;

/// Unified error type for the agent runtime.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- Model errors --------------------------------------------------------
    /// The injected model capability failed to produce a reply.
    #[error("llm request failed: {reason}")]
    LlmRequestFailed { reason: String },

    // -- Budget exhaustion ---------------------------------------------------
    /// Every corrective retry still produced a reply without a usable
    /// decision.
    #[error("agent gave up: max retries reached ({attempts} corrective attempts without a valid response)")]
    MaxRetriesExceeded { attempts: u32 },

    /// The loop ran out of iterations before producing a final answer.
    #[error("agent gave up: max steps reached ({max_steps}) for run {run_id}")]
    MaxStepsExceeded { run_id: Uuid, max_steps: u32 },

    // -- Decision errors -----------------------------------------------------
    /// `action_input` could not be interpreted as a mapping of named
    /// arguments.
    #[error("invalid action_input for `{action}`: {reason}")]
    InvalidActionInput { action: String, reason: String },

    /// A decision passed validation but carried neither an action nor a
    /// final answer.
    #[error("no action or final answer in step {step}")]
    NoDecision { step: u32 },

    // -- Run control ---------------------------------------------------------
    /// The run was cancelled from outside while a call was in flight.
    #[error("run {run_id} was cancelled")]
    Cancelled { run_id: Uuid },

    // -- Configuration errors ------------------------------------------------
    /// Configuration validation or loading failed.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    // -- Generic -------------------------------------------------------------
    /// Catch-all for unexpected internal errors.  Prefer a typed variant
    /// whenever possible.
    #[error("internal agent error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Whether the run stopped because a budget ran out ("the agent gave
    /// up") rather than because something broke.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(
            self,
            Self::MaxRetriesExceeded { .. } | Self::MaxStepsExceeded { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Failure reported by a tool handler.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A declared parameter was not supplied.
    #[error("missing required argument `{name}`")]
    MissingArgument { name: String },

    /// An argument was supplied that the tool does not declare.
    #[error("unexpected argument `{name}`")]
    UnexpectedArgument { name: String },

    /// The tool ran and failed.
    #[error("{0}")]
    Failed(String),

    /// Any other error raised by the handler.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ToolError {
    /// Shorthand for [`ToolError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}
