//! CLI entry point for nanoagent.
//!
//! This binary provides the `nanoagent` command: it wires an
//! OpenAI-compatible model and the demonstration tools into the core
//! runtime and runs tasks from the command line.

mod cli;
mod config;
mod llm;
mod tools;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use nanoagent_core::{Agent, AgentError, CancellationToken, History, PromptFormatter};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, Overrides};
use crate::config::AppConfig;
use crate::llm::OpenAiCompatModel;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Run {
            task,
            overrides,
            show_history,
        } => cmd_run(cli.config.as_deref(), &task, &overrides, show_history).await,
        Commands::Tools => cmd_tools(),
        Commands::Prompt { task } => cmd_prompt(&task),
    }
}

// ---------------------------------------------------------------------------
// Subcommand: run
// ---------------------------------------------------------------------------

async fn cmd_run(
    config_path: Option<&std::path::Path>,
    task: &str,
    overrides: &Overrides,
    show_history: bool,
) -> Result<ExitCode> {
    let mut config = AppConfig::load(config_path)?;
    config.apply_overrides(overrides);
    config.validate().context("invalid configuration")?;

    let model = OpenAiCompatModel::new(config.llm.clone()).context("failed to create LLM client")?;
    let agent = Agent::new(model)
        .with_config(config.agent.clone())
        .with_registry(Arc::new(tools::registry()));

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            ctrl_c.cancel();
        }
    });

    info!(model = %config.llm.model, "running task");

    let mut session = agent.session(task).with_cancellation(token);
    let outcome = session.execute().await;

    if show_history {
        print_history(session.history());
    }

    match outcome {
        Ok(answer) => {
            println!("{answer}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report_failure(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_history(history: &History) {
    if history.is_empty() {
        eprintln!("(no steps recorded)");
    } else {
        eprintln!("{}", history.render());
    }
}

fn report_failure(error: &AgentError) {
    if error.is_budget_exhausted() {
        // The message already reads "agent gave up: ...".
        eprintln!("{error}");
    } else {
        eprintln!("agent failed: {error}");
    }
}

// ---------------------------------------------------------------------------
// Subcommand: tools
// ---------------------------------------------------------------------------

fn cmd_tools() -> Result<ExitCode> {
    println!("{}", tools::registry().list());
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Subcommand: prompt
// ---------------------------------------------------------------------------

fn cmd_prompt(task: &str) -> Result<ExitCode> {
    let prompt = PromptFormatter::format(task, &tools::registry(), &History::new());
    println!("{prompt}");
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the global tracing subscriber on stderr.  `RUST_LOG` takes
/// precedence over `default_level`.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
