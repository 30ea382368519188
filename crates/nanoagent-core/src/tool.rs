//! Tools the agent can invoke.
//!
//! A [`Tool`] pairs an invocation entry point (a [`ToolHandler`]) with the
//! metadata the model needs to choose it: a unique name, a human-readable
//! description and an ordered list of parameter descriptors.  The
//! descriptors are advisory; they document the tool to the model and drive
//! argument binding, but argument types are never checked.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::ToolError;

/// Named arguments passed to a tool.
pub type ToolArgs = Map<String, Value>;

// ---------------------------------------------------------------------------
// Parameter descriptors
// ---------------------------------------------------------------------------

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Free text.  Used whenever no type is declared.
    #[default]
    String,
    /// Whole number.
    Integer,
    /// Any JSON number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// JSON object.
    Object,
    /// JSON array.
    Array,
}

impl ParamType {
    /// The lowercase name used in prompts and JSON schemas.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{name, type}` entry of a tool's parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Argument name the model must use in `action_input`.
    pub name: String,

    /// Declared type.
    #[serde(rename = "type", default)]
    pub kind: ParamType,
}

impl ParameterSpec {
    /// Create a typed descriptor.
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a descriptor without a declared type (rendered as `string`).
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::default())
    }
}

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// The invocation entry point behind a [`Tool`].
///
/// Any async closure `Fn(ToolArgs) -> impl Future<Output = Result<Value,
/// ToolError>>` is a handler.  Types implementing the trait by hand may also
/// describe themselves, which [`Tool::new`] picks up when no explicit
/// description or parameter list is supplied.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with bound arguments.
    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError>;

    /// Documentation for the model, if the handler carries any.
    fn description(&self) -> Option<String> {
        None
    }

    /// Parameters the handler declares, in call order.
    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    async fn call(&self, args: ToolArgs) -> Result<Value, ToolError> {
        (self)(args).await
    }
}

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

/// A named, invocable capability the agent may select while reasoning.
///
/// Built once with [`Tool::new`] and the `with_*` methods, then handed to a
/// [`ToolRegistry`](crate::registry::ToolRegistry); there is no way to
/// change a tool's metadata through a shared reference.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Wrap a handler under the given name.
    ///
    /// The description defaults to the handler's own description, or to
    /// `"{name} tool"` when it has none.
    pub fn new(name: impl Into<String>, handler: impl ToolHandler + 'static) -> Self {
        let name = name.into();
        let description = handler
            .description()
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("{name} tool"));
        let parameters = handler.parameters();

        Self {
            name,
            description,
            parameters,
            handler: Arc::new(handler),
        }
    }

    /// Override the description.  Blank descriptions are ignored.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        let trimmed = description.trim();
        if !trimmed.is_empty() {
            self.description = trimmed.to_owned();
        }
        self
    }

    /// Append a parameter descriptor.
    pub fn with_param(mut self, name: impl Into<String>, kind: ParamType) -> Self {
        self.parameters.push(ParameterSpec::new(name, kind));
        self
    }

    /// Replace the parameter list.
    pub fn with_params(mut self, params: impl IntoIterator<Item = ParameterSpec>) -> Self {
        self.parameters = params.into_iter().collect();
        self
    }

    /// Unique name the model uses to select this tool.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Ordered parameter descriptors.
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// JSON Schema object form of the parameter list.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), json!({ "type": p.kind.as_str() })))
            .collect();
        let required: Vec<Value> = self
            .parameters
            .iter()
            .map(|p| Value::String(p.name.clone()))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Bind `args` against the declared parameters and run the handler.
    pub async fn invoke(&self, args: ToolArgs) -> Result<Value, ToolError> {
        self.bind(&args)?;
        self.handler.call(args).await
    }

    /// Check that every declared parameter is present and nothing else is.
    ///
    /// Tools without declared parameters accept any arguments.
    fn bind(&self, args: &ToolArgs) -> Result<(), ToolError> {
        if self.parameters.is_empty() {
            return Ok(());
        }

        if let Some(missing) = self
            .parameters
            .iter()
            .find(|p| !args.contains_key(&p.name))
        {
            return Err(ToolError::MissingArgument {
                name: missing.name.clone(),
            });
        }

        if let Some(extra) = args
            .keys()
            .find(|k| !self.parameters.iter().any(|p| &p.name == *k))
        {
            return Err(ToolError::UnexpectedArgument {
                name: extra.clone(),
            });
        }

        Ok(())
    }

    /// Compact JSON rendering of the parameter list, as shown in prompts.
    fn schema_text(&self) -> String {
        Value::Array(
            self.parameters
                .iter()
                .map(|p| json!({ "name": p.name, "type": p.kind.as_str() }))
                .collect(),
        )
        .to_string()
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tool: {}\nDesc: {}\nArgs: {}",
            self.name,
            self.description,
            self.schema_text()
        )
    }
}

/// Render a tool's return value as observation text.
///
/// Strings are used verbatim; every other value is rendered as compact JSON.
pub fn observation_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
