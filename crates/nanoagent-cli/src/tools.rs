//! Demonstration tools registered by the `nanoagent` binary.

use nanoagent_core::{ParamType, Tool, ToolArgs, ToolError, ToolRegistry};
use serde_json::{Number, Value};

/// A registry holding every demonstration tool.
pub fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(add());
    registry.register(multiply());
    registry
}

/// `add(a, b)`.
pub fn add() -> Tool {
    Tool::new("add", |args: ToolArgs| async move {
        Ok::<Value, ToolError>(number_value(operand(&args, "a")? + operand(&args, "b")?))
    })
    .with_description("Use this tool to add two numbers")
    .with_param("a", ParamType::Number)
    .with_param("b", ParamType::Number)
}

/// `multiply(a, b)`.
pub fn multiply() -> Tool {
    Tool::new("multiply", |args: ToolArgs| async move {
        Ok::<Value, ToolError>(number_value(operand(&args, "a")? * operand(&args, "b")?))
    })
    .with_description("Use this tool to multiply two numbers")
    .with_param("a", ParamType::Number)
    .with_param("b", ParamType::Number)
}

/// Read a numeric argument, accepting numbers and numeric strings.
fn operand(args: &ToolArgs, name: &str) -> Result<f64, ToolError> {
    let value = args.get(name).ok_or_else(|| ToolError::MissingArgument {
        name: name.to_owned(),
    })?;

    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ToolError::failed(format!("argument `{name}` is not a number: {value}")))
}

/// Render integral results without a fractional part.
fn number_value(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        Value::from(x as i64)
    } else {
        Number::from_f64(x).map_or(Value::Null, Value::Number)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
