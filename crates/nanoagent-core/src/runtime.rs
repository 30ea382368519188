//! Core reason-act-observe runtime.
//!
//! Each iteration renders a prompt from the task, the tool registry and the
//! history, asks the model for a decision, and either returns the final
//! answer or runs the selected tool and records what it produced.  A reply
//! that carries no usable decision triggers a bounded series of corrective
//! calls before the run gives up.
//!
//! Iterations are strictly sequential: every prompt depends on the complete
//! history including the step recorded just before it.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::executor::{Execution, ToolExecutor};
use crate::parser::{ParsedResponse, ResponseParser, strip_reasoning};
use crate::prompt::PromptFormatter;
use crate::registry::ToolRegistry;
use crate::step::{History, Step};
use crate::tool::{Tool, ToolArgs};

// ---------------------------------------------------------------------------
// Model capability
// ---------------------------------------------------------------------------

/// The injected model-call capability: prompt in, reply text out.
///
/// Implementations own everything about the transport (HTTP, auth, model
/// selection).  Any async closure `Fn(String) -> impl Future<Output =
/// Result<String>>` is a model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` and return the raw reply.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<F, Fut> LanguageModel for F
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    async fn complete(&self, prompt: &str) -> Result<String> {
        (self)(prompt.to_owned()).await
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A model, a set of tools and the budgets that bound a run.
///
/// The agent itself holds no per-run state; every call to [`Agent::run`] or
/// [`Agent::session`] gets its own history, so one agent can serve several
/// independent runs at once.
#[derive(Clone)]
pub struct Agent {
    model: Arc<dyn LanguageModel>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create an agent with default budgets and no tools.
    pub fn new(model: impl LanguageModel + 'static) -> Self {
        Self::from_shared(Arc::new(model))
    }

    /// Create an agent around an already-shared model.
    pub fn from_shared(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            registry: Arc::new(ToolRegistry::new()),
            config: AgentConfig::default(),
        }
    }

    /// Replace the budgets.
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a registry that may be shared with other agents.
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Register a tool, builder style.
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.add_tool(tool);
        self
    }

    /// Register a tool.  If the registry is shared, this agent gets its own
    /// copy first.
    pub fn add_tool(&mut self, tool: Tool) {
        Arc::make_mut(&mut self.registry).register(tool);
    }

    /// The tools this agent can call.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The budgets in effect.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Start a run without executing it, to keep access to its history.
    pub fn session(&self, task: impl Into<String>) -> AgentRun<'_> {
        AgentRun::new(self, task.into())
    }

    /// Run `task` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::MaxStepsExceeded`] or
    /// [`AgentError::MaxRetriesExceeded`] when a budget runs out,
    /// [`AgentError::InvalidActionInput`] when the model's tool arguments
    /// cannot be decoded, and propagates failures of the model capability.
    pub async fn run(&self, task: impl Into<String>) -> Result<AgentResponse> {
        let mut session = self.session(task);
        let answer = session.execute().await?;
        let run_id = session.run_id();

        Ok(AgentResponse {
            answer,
            steps: session.into_history().into_steps(),
            run_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Agent response
// ---------------------------------------------------------------------------

/// The result of a successful run.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The model's final answer.
    pub answer: String,

    /// Every step recorded during the run, in order.
    pub steps: Vec<Step>,

    /// Identifier of the run.
    pub run_id: Uuid,
}

// ---------------------------------------------------------------------------
// Agent run
// ---------------------------------------------------------------------------

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, not yet executed.
    Ready,
    /// Iterating.
    Running,
    /// Executing the tool selected by the current step.
    ToolCall,
    /// A final answer was produced.
    Succeeded,
    /// A budget ran out or a fatal error occurred.
    Failed,
}

/// The exclusive state of one run: its task, history and step counter.
pub struct AgentRun<'a> {
    agent: &'a Agent,
    run_id: Uuid,
    task: String,
    history: History,
    step_index: u32,
    state: RunState,
    executor: ToolExecutor,
    cancel: Option<CancellationToken>,
}

impl<'a> AgentRun<'a> {
    fn new(agent: &'a Agent, task: String) -> Self {
        Self {
            agent,
            run_id: Uuid::now_v7(),
            task,
            history: History::new(),
            step_index: 1,
            state: RunState::Ready,
            executor: ToolExecutor::from_config(&agent.config),
            cancel: None,
        }
    }

    /// Let `token` cancel this run.  Cancelling interrupts an in-flight
    /// model or tool call and fails the run with
    /// [`AgentError::Cancelled`].
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Identifier used in logs and errors.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The task this run is working on.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Steps recorded so far.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Consume the run, keeping its history.
    pub fn into_history(self) -> History {
        self.history
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Drive the loop until a final answer or a fatal condition.
    ///
    /// A run executes once; calling this again returns an error without
    /// touching the model.  Budgets that fail [`AgentConfig::validate`] are
    /// rejected before the first model call.
    pub async fn execute(&mut self) -> Result<String> {
        if self.state != RunState::Ready {
            return Err(AgentError::Internal(format!(
                "run {} has already been executed ({:?})",
                self.run_id, self.state
            )));
        }

        if let Err(e) = self.agent.config.validate() {
            self.state = RunState::Failed;
            return Err(e);
        }

        self.state = RunState::Running;
        let outcome = self.iterate().await;
        self.state = match outcome {
            Ok(_) => RunState::Succeeded,
            Err(_) => RunState::Failed,
        };

        match &outcome {
            Ok(_) => tracing::info!(
                run_id = %self.run_id,
                steps = self.history.len(),
                "agent run completed with final answer"
            ),
            Err(e) => tracing::warn!(
                run_id = %self.run_id,
                steps = self.history.len(),
                error = %e,
                "agent run failed"
            ),
        }

        outcome
    }

    async fn iterate(&mut self) -> Result<String> {
        let agent = self.agent;
        let max_steps = agent.config.max_steps;

        tracing::info!(
            run_id = %self.run_id,
            max_steps,
            max_retries = agent.config.max_retries,
            tool_count = agent.registry.len(),
            "starting agent run"
        );

        while self.step_index <= max_steps {
            let step = self.step_index;
            self.ensure_not_cancelled()?;

            let prompt = PromptFormatter::format(&self.task, &agent.registry, &self.history);
            tracing::debug!(run_id = %self.run_id, step, prompt = %prompt, "prompt rendered");

            let reply = self.call_model(&prompt).await?;
            let mut decision = ResponseParser::parse(&reply);
            if !decision.is_valid() {
                tracing::warn!(
                    run_id = %self.run_id,
                    step,
                    "model reply has no usable decision, requesting a correction"
                );
                decision = self.request_correction(&prompt, reply).await?;
            }

            self.history.push(Step::new(step, decision.thought.clone()));

            if decision.has_final_answer() {
                tracing::info!(run_id = %self.run_id, step, "final answer produced");
                return Ok(decision.final_answer);
            }

            if !decision.has_action() {
                return Err(AgentError::NoDecision { step });
            }

            self.act(step, &decision).await?;
            self.step_index += 1;
        }

        Err(AgentError::MaxStepsExceeded {
            run_id: self.run_id,
            max_steps,
        })
    }

    /// Resolve and run the decision's tool, then complete the current step.
    async fn act(&mut self, step: u32, decision: &ParsedResponse) -> Result<()> {
        let action = decision.action.trim().to_owned();
        let args = decision.arguments()?;

        tracing::info!(run_id = %self.run_id, step, tool = %action, "model selected tool");

        let observation = match self.agent.registry.get(&action) {
            Some(tool) => {
                self.state = RunState::ToolCall;
                let execution = self.run_tool(&tool, &args).await?;
                self.state = RunState::Running;
                execution.observation
            }
            None => {
                tracing::warn!(run_id = %self.run_id, step, tool = %action, "unknown tool requested");
                format!("Tool '{action}' not found")
            }
        };

        if let Some(current) = self.history.last_mut() {
            current.set_action(action, args);
            current.set_observation(observation);
        }

        Ok(())
    }

    /// Re-ask the model after an unusable reply, up to `max_retries` times.
    async fn request_correction(
        &self,
        original_prompt: &str,
        mut previous: String,
    ) -> Result<ParsedResponse> {
        let max_retries = self.agent.config.max_retries;

        for attempt in 1..=max_retries {
            let retry_prompt = PromptFormatter::format_retry(original_prompt, &previous);
            let reply = self.call_model(&retry_prompt).await?;
            let decision = ResponseParser::parse(&reply);

            if decision.is_valid() {
                tracing::info!(run_id = %self.run_id, attempt, "model corrected its reply");
                return Ok(decision);
            }

            tracing::warn!(
                run_id = %self.run_id,
                attempt,
                max_retries,
                "corrective reply still unusable"
            );
            previous = reply;
        }

        Err(AgentError::MaxRetriesExceeded {
            attempts: max_retries,
        })
    }

    /// Call the model and strip any internal-reasoning markup from the reply.
    async fn call_model(&self, prompt: &str) -> Result<String> {
        let call = self.agent.model.complete(prompt);
        let raw = match &self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => return Err(AgentError::Cancelled { run_id: self.run_id }),
                result = call => result?,
            },
            None => call.await?,
        };

        let reply = strip_reasoning(&raw);
        tracing::debug!(run_id = %self.run_id, reply = %reply, "model replied");
        Ok(reply)
    }

    async fn run_tool(&self, tool: &Tool, args: &ToolArgs) -> Result<Execution> {
        let execution = self.executor.execute(tool, args);
        match &self.cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Err(AgentError::Cancelled { run_id: self.run_id }),
                execution = execution => Ok(execution),
            },
            None => Ok(execution.await),
        }
    }

    fn ensure_not_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(AgentError::Cancelled {
                run_id: self.run_id,
            }),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
