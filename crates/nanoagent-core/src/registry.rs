//! Tool registry.
//!
//! The registry owns every [`Tool`] an agent may call, keyed by unique
//! name.  Listing follows registration order so the rendered tool section
//! of a prompt is identical on every iteration of a run.
//!
//! # Example
//!
//! ```rust
//! # use nanoagent_core::{ParamType, Tool, ToolArgs, ToolError, ToolRegistry};
//! # use serde_json::{Value, json};
//! async fn add(args: ToolArgs) -> Result<Value, ToolError> {
//!     Ok(json!(args["a"].as_i64().unwrap_or(0) + args["b"].as_i64().unwrap_or(0)))
//! }
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(
//!     Tool::new("add", add)
//!         .with_description("Use this tool to add two numbers")
//!         .with_param("a", ParamType::Integer)
//!         .with_param("b", ParamType::Integer),
//! );
//!
//! assert!(registry.get("add").is_some());
//! assert!(registry.get("subtract").is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::tool::Tool;

/// Name-keyed collection of tools.
///
/// Registration is expected to finish before a run starts; the agent only
/// ever reads the registry, so a populated registry can be shared behind an
/// [`Arc`] by any number of concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    /// Tools in registration order.
    tools: Vec<Arc<Tool>>,
    /// Name to position in `tools`.
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// If a tool with the same name already exists it is overwritten in
    /// place, keeping its original listing position.
    pub fn register(&mut self, tool: Tool) {
        let name = tool.name().to_owned();
        let tool = Arc::new(tool);

        match self.index.get(&name) {
            Some(&pos) => {
                tracing::debug!(tool = %name, "tool re-registered, replacing previous definition");
                self.tools[pos] = tool;
            }
            None => {
                tracing::debug!(tool = %name, "tool registered");
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Look up a tool by name.  `None` means the tool is unknown.
    pub fn get(&self, name: &str) -> Option<Arc<Tool>> {
        self.index.get(name).map(|&pos| Arc::clone(&self.tools[pos]))
    }

    /// Whether a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Render every tool for inclusion in a prompt, separated by blank lines.
    pub fn list(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Tool names in listing order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Iterate over tools in listing order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Tool>> {
        self.tools.iter()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
