//! Agent configuration.
//!
//! Budgets for the reason-act-observe loop.  Loaded from TOML (either a
//! standalone file or a table embedded in a host's own config) or built in
//! code.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AgentError, Result};

/// Budgets for a single agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum number of iterations before the run gives up.
    pub max_steps: u32,

    /// Corrective model calls allowed after an unusable reply, and total
    /// attempts allowed per tool invocation.
    pub max_retries: u32,

    /// Pause between failed tool attempts.  Zero retries immediately.
    #[serde(rename = "tool_retry_delay_ms", with = "millis")]
    pub tool_retry_delay: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            max_retries: 3,
            tool_retry_delay: Duration::ZERO,
        }
    }
}

impl AgentConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| AgentError::ConfigError {
            reason: format!("failed to parse TOML config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.  A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = ?path, "agent config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| AgentError::ConfigError {
            reason: format!("failed to read config file {}: {e}", path.display()),
        })?;
        let config = Self::from_toml_str(&content)?;

        info!(path = ?path, max_steps = config.max_steps, max_retries = config.max_retries, "agent config loaded");
        Ok(config)
    }

    /// Reject budgets the loop cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(AgentError::ConfigError {
                reason: "max_retries must be at least 1 (a tool is always attempted once)".into(),
            });
        }
        Ok(())
    }
}

/// (De)serialize a [`Duration`] as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_steps, 10);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.tool_retry_delay, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AgentConfig::from_toml_str("max_steps = 4\n").unwrap();
        assert_eq!(config.max_steps, 4);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn retry_delay_is_read_in_milliseconds() {
        let config = AgentConfig::from_toml_str("tool_retry_delay_ms = 250\n").unwrap();
        assert_eq!(config.tool_retry_delay, Duration::from_millis(250));

        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("tool_retry_delay_ms = 250"));
    }

    #[test]
    fn zero_retries_is_rejected() {
        let err = AgentConfig::from_toml_str("max_retries = 0\n").unwrap_err();
        assert!(matches!(err, AgentError::ConfigError { .. }));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = AgentConfig::from_toml_str("max_steps = \"many\"").unwrap_err();
        assert!(err.to_string().starts_with("config error: failed to parse TOML config"));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_steps = 2\nmax_retries = 5").unwrap();

        let config = AgentConfig::load(file.path()).unwrap();
        assert_eq!(config.max_steps, 2);
        assert_eq!(config.max_retries, 5);

        let dir = tempfile::tempdir().unwrap();
        let missing = AgentConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(missing, AgentConfig::default());
    }
}
