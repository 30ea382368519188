//! Tool executor.
//!
//! Runs a resolved [`Tool`] with a bounded number of attempts.  Failures
//! are never propagated: once the attempts are spent the last error is
//! folded into the observation text and the loop carries on, so the model
//! can see what went wrong and choose differently.

use std::time::Duration;

use crate::config::AgentConfig;
use crate::tool::{Tool, ToolArgs, observation_text};

// ---------------------------------------------------------------------------
// Execution record
// ---------------------------------------------------------------------------

/// Outcome of running one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Text recorded as the step's observation.
    pub observation: String,

    /// Number of attempts made (1 = first try succeeded).
    pub attempts: u32,

    /// Whether any attempt succeeded.
    pub succeeded: bool,
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Invokes tools with bounded retry.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    /// Total attempts per call, including the first.
    max_attempts: u32,

    /// Delay between attempts.
    retry_delay: Duration,
}

impl ToolExecutor {
    /// Create an executor making at most `max_attempts` attempts per call.
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Create an executor from the agent's retry budget.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.max_retries, config.tool_retry_delay)
    }

    /// Run `tool` with `args`, retrying on failure.
    pub async fn execute(&self, tool: &Tool, args: &ToolArgs) -> Execution {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            tracing::debug!(
                tool = %tool.name(),
                attempt,
                max_attempts = self.max_attempts,
                "tool execution attempt"
            );

            match tool.invoke(args.clone()).await {
                Ok(value) => {
                    let observation = observation_text(&value);
                    tracing::info!(
                        tool = %tool.name(),
                        attempt,
                        chars = observation.len(),
                        "tool completed successfully"
                    );
                    return Execution {
                        observation,
                        attempts: attempt,
                        succeeded: true,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        tool = %tool.name(),
                        attempt,
                        error = %e,
                        "tool execution failed"
                    );
                    last_error = e.to_string();

                    if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Execution {
            observation: format!("Error after {} retries: {last_error}", self.max_attempts),
            attempts: self.max_attempts,
            succeeded: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
