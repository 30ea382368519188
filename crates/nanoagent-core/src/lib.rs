//! Minimal reason-act-observe agent runtime.
//!
//! An [`Agent`] repeatedly asks a language model what to do next, given a
//! task, a catalogue of tools and the history of what it has done so far.
//! The model either calls a tool, whose result is recorded as an
//! observation, or produces a final answer that ends the run.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  prompt  ┌───────────────┐  reply  ┌────────────────┐
//! │ PromptFormat │─────────>│ LanguageModel │────────>│ ResponseParser │
//! └──────┬───────┘          └───────────────┘         └───────┬────────┘
//!        │                                                    │
//!        │ history          ┌───────────────┐   action        │
//!        └──────────────────│ ToolExecutor  │<────────────────┘
//!                           │ (ToolRegistry)│
//!                           └───────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`runtime`] -- The agent loop and the model capability trait.
//! - [`tool`] -- Tool definitions and the handler trait.
//! - [`registry`] -- Name-indexed tool catalogue.
//! - [`executor`] -- Tool invocation with bounded retry.
//! - [`parser`] -- Extraction of structured decisions from model replies.
//! - [`prompt`] -- Prompt rendering.
//! - [`step`] -- Per-iteration records and the run history.
//! - [`config`] -- Loop budgets.
//! - [`error`] -- Agent and tool error types.

pub mod config;
pub mod error;
pub mod executor;
pub mod parser;
pub mod prompt;
pub mod registry;
pub mod runtime;
pub mod step;
pub mod tool;

// Re-export the most commonly used types at the crate root.
pub use config::AgentConfig;
pub use error::{AgentError, Result, ToolError};
pub use executor::{Execution, ToolExecutor};
pub use parser::{ParsedResponse, ResponseParser, strip_reasoning};
pub use prompt::{NO_HISTORY, PromptFormatter};
pub use registry::ToolRegistry;
pub use runtime::{Agent, AgentResponse, AgentRun, LanguageModel, RunState};
pub use step::{History, Step};
pub use tool::{ParamType, ParameterSpec, Tool, ToolArgs, ToolHandler, observation_text};
pub use tokio_util::sync::CancellationToken;
