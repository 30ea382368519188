//! Application configuration.
//!
//! Layered in order of increasing precedence: built-in defaults, an
//! optional TOML file with `[agent]` and `[llm]` tables, environment
//! variables (a `.env` file is honoured), then command-line flags.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use nanoagent_core::AgentConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cli::Overrides;

/// Environment variables consulted for the API key, first match wins.
const API_KEY_VARS: &[&str] = &["NANOAGENT_API_KEY", "GROQ_API_KEY", "OPENAI_API_KEY"];

// ---------------------------------------------------------------------------
// LLM settings
// ---------------------------------------------------------------------------

/// Settings for the OpenAI-compatible chat-completions endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL, without the trailing `/chat/completions`.
    pub base_url: String,

    /// Model identifier.
    pub model: String,

    /// Bearer token.  Usually supplied through the environment.
    #[serde(skip_serializing)]
    pub api_key: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".into(),
            model: "qwen-2.5-32b".into(),
            api_key: String::new(),
            temperature: 0.9,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &api_key)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// App config
// ---------------------------------------------------------------------------

/// Everything the binary needs to build and run an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load from `path` (if given), then apply the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env_non_empty);
        Ok(config)
    }

    /// Read a TOML file.  A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = ?path, "config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        info!(path = ?path, model = %config.llm.model, "config loaded");
        Ok(config)
    }

    /// Overlay values from the environment, read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = API_KEY_VARS.iter().find_map(|&var| lookup(var)) {
            self.llm.api_key = key;
        }
        if let Some(url) = lookup("NANOAGENT_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("NANOAGENT_MODEL") {
            self.llm.model = model;
        }
    }

    /// Overlay command-line flags.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(model) = &overrides.model {
            self.llm.model.clone_from(model);
        }
        if let Some(max_steps) = overrides.max_steps {
            self.agent.max_steps = max_steps;
        }
        if let Some(max_retries) = overrides.max_retries {
            self.agent.max_retries = max_retries;
        }
    }

    /// Check the combined settings before a run.
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        if self.llm.api_key.is_empty() {
            anyhow::bail!(
                "no API key configured: set one of {} or `api_key` under [llm]",
                API_KEY_VARS.join(", ")
            );
        }
        Ok(())
    }
}

/// Read a non-empty environment variable, returning `None` if unset or empty.
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
