//! CLI argument definitions for nanoagent.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// nanoagent -- a minimal reason-act-observe agent.
#[derive(Parser)]
#[command(
    name = "nanoagent",
    version,
    about = "nanoagent -- minimal reason-act-observe agent",
    long_about = "Runs a language model in a reason-act-observe loop: the model picks \
                  tools, sees what they return, and stops once it has a final answer."
)]
pub struct Cli {
    /// Path to a TOML config file with `[agent]` and `[llm]` tables.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Default log level when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the agent on a task and print its final answer.
    Run {
        /// The task, in plain language.
        task: String,

        #[command(flatten)]
        overrides: Overrides,

        /// Also print every recorded step.
        #[arg(long)]
        show_history: bool,
    },

    /// List the tools exactly as the model sees them.
    Tools,

    /// Print the first-iteration prompt for a task without calling the model.
    Prompt {
        /// The task, in plain language.
        task: String,
    },
}

/// Command-line overrides applied on top of the file and environment.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Model identifier sent to the chat-completions endpoint.
    #[arg(long, short)]
    pub model: Option<String>,

    /// Maximum number of iterations.
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Corrective model calls per unusable reply, and attempts per tool call.
    #[arg(long)]
    pub max_retries: Option<u32>,
}
