//! End-to-end tests for the agent loop.
//!
//! The model is a scripted double that hands out canned replies in order and
//! records every prompt it receives, so each test can assert both on the
//! run's outcome and on exactly what the agent asked.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nanoagent_core::{
    Agent, AgentConfig, AgentError, LanguageModel, NO_HISTORY, ParamType, Result, RunState, Tool,
    ToolArgs, ToolError,
};
use serde_json::{Value, json};

// ── helpers ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, n: usize) -> String {
        self.prompts.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::LlmRequestFailed {
                reason: "script exhausted".into(),
            })
    }
}

fn agent(model: &Arc<ScriptedModel>) -> Agent {
    Agent::from_shared(Arc::clone(model) as Arc<dyn LanguageModel>)
}

fn fenced(value: Value) -> String {
    format!("```json\n{value}\n```")
}

fn call(thought: &str, action: &str, input: Value) -> String {
    fenced(json!({
        "thought": thought,
        "action": action,
        "action_input": input,
        "final_answer": "",
    }))
}

fn finish(thought: &str, answer: &str) -> String {
    fenced(json!({
        "thought": thought,
        "action": "",
        "action_input": {},
        "final_answer": answer,
    }))
}

fn number(args: &ToolArgs, key: &str) -> std::result::Result<f64, ToolError> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError::failed(format!("`{key}` must be a number")))
}

fn add_tool() -> Tool {
    Tool::new("add", |args: ToolArgs| async move {
        let sum = number(&args, "a")? + number(&args, "b")?;
        Ok::<Value, ToolError>(json!(sum as i64))
    })
    .with_description("Use this tool to add two numbers")
    .with_param("a", ParamType::Integer)
    .with_param("b", ParamType::Integer)
}

// ── termination ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn final_answer_on_first_reply_ends_the_run() {
    let model = ScriptedModel::new([finish("trivial", "done")]);
    let response = agent(&model).run("say done").await.unwrap();

    assert_eq!(response.answer, "done");
    assert_eq!(response.steps.len(), 1);
    assert_eq!(response.steps[0].index, 1);
    assert!(response.steps[0].action.is_none());
    assert_eq!(model.calls(), 1);
    assert!(model.prompt(0).contains(NO_HISTORY));
}

#[tokio::test]
async fn add_two_and_three() {
    let model = ScriptedModel::new([
        call("I should add", "add", json!({"a": 2, "b": 3})),
        finish("I have the sum", "5"),
    ]);
    let response = agent(&model)
        .with_tool(add_tool())
        .run("add 2 and 3")
        .await
        .unwrap();

    assert_eq!(response.answer, "5");
    assert_eq!(response.steps.len(), 2);

    let first = &response.steps[0];
    assert_eq!(first.index, 1);
    assert_eq!(first.action.as_deref(), Some("add"));
    assert_eq!(first.observation.as_deref(), Some("5"));

    // The second prompt carries the completed first step.
    let second_prompt = model.prompt(1);
    assert!(second_prompt.contains("--- Iteration:1 ---"));
    assert!(second_prompt.contains("observation: 5"));
    assert!(!second_prompt.contains(NO_HISTORY));
}

#[tokio::test]
async fn step_budget_of_one_allows_exactly_one_model_call() {
    let model = ScriptedModel::new([
        call("add first", "add", json!({"a": 1, "b": 1})),
        finish("never reached", "2"),
    ]);
    let config = AgentConfig {
        max_steps: 1,
        ..AgentConfig::default()
    };
    let agent = agent(&model).with_config(config).with_tool(add_tool());
    let mut session = agent.session("add");

    let err = session.execute().await.unwrap_err();

    assert!(matches!(err, AgentError::MaxStepsExceeded { max_steps: 1, .. }));
    assert!(err.is_budget_exhausted());
    assert!(err.to_string().starts_with("agent gave up: max steps reached (1)"));
    assert_eq!(model.calls(), 1);
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history().last().unwrap().observation.as_deref(), Some("2"));
}

#[tokio::test]
async fn history_grows_by_one_step_per_iteration() {
    let model = ScriptedModel::new([
        call("one", "add", json!({"a": 1, "b": 0})),
        call("two", "add", json!({"a": 1, "b": 1})),
        call("three", "add", json!({"a": 1, "b": 2})),
        finish("four", "3"),
    ]);
    let agent = agent(&model).with_tool(add_tool());
    let mut session = agent.session("count");

    session.execute().await.unwrap();

    let indices: Vec<u32> = session.history().iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 2, 3, 4]);
    let observations: Vec<Option<&str>> = session
        .history()
        .iter()
        .map(|s| s.observation.as_deref())
        .collect();
    assert_eq!(observations, vec![Some("1"), Some("2"), Some("3"), None]);
}

#[tokio::test]
async fn zero_retry_budget_is_rejected_before_calling_the_model() {
    let model = ScriptedModel::new([
        call("use it", "add", json!({"a": 1, "b": 1})),
        finish("done", "2"),
    ]);
    let config = AgentConfig {
        max_retries: 0,
        ..AgentConfig::default()
    };
    let agent = agent(&model).with_config(config).with_tool(add_tool());
    let mut session = agent.session("add");

    let err = session.execute().await.unwrap_err();

    assert!(matches!(err, AgentError::ConfigError { .. }));
    assert!(!err.is_budget_exhausted());
    assert_eq!(model.calls(), 0);
    assert!(session.history().is_empty());
    assert_eq!(session.state(), RunState::Failed);
}

// ── corrective retries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn corrected_reply_is_adopted() {
    let model = ScriptedModel::new(["I think the answer is 5".to_owned(), finish("fixed", "5")]);
    let response = agent(&model).run("add 2 and 3").await.unwrap();

    assert_eq!(response.answer, "5");
    assert_eq!(response.steps.len(), 1);
    assert_eq!(response.steps[0].thought, "fixed");
    assert_eq!(model.calls(), 2);

    let retry = model.prompt(1);
    assert!(retry.starts_with(
        "Your previous response was not in the correct JSON format:\nI think the answer is 5"
    ));
    assert!(retry.ends_with(&model.prompt(0)));
}

#[tokio::test]
async fn retry_budget_bounds_corrective_calls() {
    let model = ScriptedModel::new(["nope", "still nope", "no", "never", "unused"]);
    let config = AgentConfig {
        max_retries: 3,
        ..AgentConfig::default()
    };

    let err = agent(&model).with_config(config).run("task").await.unwrap_err();

    assert!(matches!(err, AgentError::MaxRetriesExceeded { attempts: 3 }));
    assert!(err.to_string().starts_with("agent gave up: max retries reached"));
    // One original call plus three corrections.
    assert_eq!(model.calls(), 4);
    // Each correction quotes the reply it is correcting.
    assert!(model.prompt(2).contains("still nope"));
    assert!(model.prompt(3).contains("\nno\n"));
}

// ── tool outcomes ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_tool_is_observed_not_raised() {
    let model = ScriptedModel::new([
        call("try it", "divide", json!({"a": 1, "b": 2})),
        finish("no divide tool", "unavailable"),
    ]);
    let response = agent(&model)
        .with_tool(add_tool())
        .run("divide")
        .await
        .unwrap();

    assert_eq!(response.answer, "unavailable");
    assert_eq!(
        response.steps[0].observation.as_deref(),
        Some("Tool 'divide' not found")
    );
    assert!(model.prompt(1).contains("Tool 'divide' not found"));
}

#[tokio::test]
async fn failing_tool_produces_one_observation_with_attempt_count() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let broken = Tool::new("broken", move |_args: ToolArgs| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<Value, ToolError>(ToolError::failed("disk on fire"))
        }
    });

    let model = ScriptedModel::new([
        call("use it", "broken", json!({})),
        finish("it failed", "gave up"),
    ]);
    let config = AgentConfig {
        max_retries: 2,
        ..AgentConfig::default()
    };
    let response = agent(&model)
        .with_config(config)
        .with_tool(broken)
        .run("break things")
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(response.steps.len(), 2);
    assert_eq!(
        response.steps[0].observation.as_deref(),
        Some("Error after 2 retries: disk on fire")
    );
}

#[tokio::test]
async fn string_encoded_arguments_are_decoded() {
    let model = ScriptedModel::new([
        call("encoded", "add", json!("{\"a\": 4, \"b\": 5}")),
        finish("sum", "9"),
    ]);
    let response = agent(&model)
        .with_tool(add_tool())
        .run("add")
        .await
        .unwrap();

    assert_eq!(response.steps[0].observation.as_deref(), Some("9"));
    assert_eq!(
        response.steps[0].action_input.as_ref().map(|a| a["b"].clone()),
        Some(json!(5))
    );
}

#[tokio::test]
async fn malformed_arguments_are_fatal() {
    let model = ScriptedModel::new([call("broken json", "add", json!("{a: 2"))]);
    let agent = agent(&model).with_tool(add_tool());
    let mut session = agent.session("add");

    let err = session.execute().await.unwrap_err();

    assert!(matches!(err, AgentError::InvalidActionInput { ref action, .. } if action == "add"));
    // The step was recorded before its arguments were decoded.
    assert_eq!(session.history().len(), 1);
    assert!(session.history().last().unwrap().action.is_none());
}

#[tokio::test]
async fn missing_argument_is_reported_to_the_model() {
    let model = ScriptedModel::new([
        call("forgot b", "add", json!({"a": 1})),
        finish("retry later", "unknown"),
    ]);
    let config = AgentConfig {
        max_retries: 1,
        ..AgentConfig::default()
    };
    let response = agent(&model)
        .with_config(config)
        .with_tool(add_tool())
        .run("add")
        .await
        .unwrap();

    assert_eq!(
        response.steps[0].observation.as_deref(),
        Some("Error after 1 retries: missing required argument `b`")
    );
}

// ── isolation ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_runs_record_identical_histories() {
    let model = ScriptedModel::new([
        call("add", "add", json!({"a": 2, "b": 3})),
        finish("sum", "5"),
        call("add", "add", json!({"a": 2, "b": 3})),
        finish("sum", "5"),
    ]);
    let agent = agent(&model).with_tool(add_tool());

    let first = agent.run("add 2 and 3").await.unwrap();
    let second = agent.run("add 2 and 3").await.unwrap();

    assert_eq!(first.answer, second.answer);
    assert_eq!(first.steps, second.steps);
    assert_eq!(first.steps[0].observation.as_deref(), Some("5"));
    assert_ne!(first.run_id, second.run_id);
    // The second run starts from an empty history again.
    assert_eq!(model.prompt(0), model.prompt(2));
    assert!(model.prompt(2).contains(NO_HISTORY));
}

#[tokio::test]
async fn exhausted_model_surfaces_its_error() {
    let model = ScriptedModel::new(Vec::<String>::new());
    let err = agent(&model).run("anything").await.unwrap_err();
    assert!(matches!(err, AgentError::LlmRequestFailed { .. }));
}
