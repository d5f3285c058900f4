//! Tools: definitions, list formatting and execution.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::capability::handler::{guarded, Arguments, ToolHandler};
use crate::error::{DefinitionError, DispatchError};
use crate::schema::{self, CompiledPatterns, SchemaNode, SchemaType};

/// A registered tool.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    input_schema: SchemaNode,
    /// Present when strict validation is enabled.
    patterns: Option<CompiledPatterns>,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Creates a tool.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::NonObjectInputSchema`] if `input_schema`
    /// does not describe an object.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: SchemaNode,
        handler: impl ToolHandler + 'static,
    ) -> Result<Self, DefinitionError> {
        let name = name.into();
        if input_schema.kind != SchemaType::Object {
            return Err(DefinitionError::NonObjectInputSchema {
                tool: name,
                actual: input_schema.kind,
            });
        }

        Ok(Self {
            name,
            description: description.into(),
            input_schema,
            patterns: None,
            handler: Arc::new(handler),
        })
    }

    /// Enforces length, range and pattern constraints on arguments.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidPattern`] if a `pattern` in the
    /// input schema is not a valid regular expression.
    pub fn with_strict_validation(mut self) -> Result<Self, DefinitionError> {
        self.patterns = Some(CompiledPatterns::compile(&self.input_schema)?);
        Ok(self)
    }

    /// The tool name (registry key).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &SchemaNode {
        &self.input_schema
    }

    /// Renders the `tools/list` entry.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("strict", &self.patterns.is_some())
            .finish_non_exhaustive()
    }
}

/// A tool definition for the `tools/list` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: SchemaNode,
}

/// Validates `arguments`, runs the tool handler and shapes its result.
///
/// # Errors
///
/// - [`DispatchError::InvalidArguments`] if the arguments fail the schema
///   (the handler is not called)
/// - [`DispatchError::HandlerFailed`] if the handler fails or panics
pub fn execute_tool(tool: &Tool, arguments: &Arguments) -> Result<Value, DispatchError> {
    let value = Value::Object(arguments.clone());
    match &tool.patterns {
        Some(patterns) => schema::validate_strict(&value, &tool.input_schema, patterns)?,
        None => schema::validate(&value, &tool.input_schema)?,
    };

    let output = guarded(|| tool.handler.call(arguments)).map_err(|source| {
        DispatchError::HandlerFailed {
            capability: format!("tool '{}'", tool.name),
            source,
        }
    })?;

    Ok(shape_tool_result(output))
}

/// Wraps a handler's raw output into the `tools/call` result envelope.
///
/// - string → one text content item
/// - object with `content` → passed through unchanged
/// - other object or array → JSON text content plus `structuredContent`
/// - anything else → its JSON rendering as text
#[must_use]
pub fn shape_tool_result(output: Value) -> Value {
    match output {
        Value::String(text) => json!({
            "content": [{ "type": "text", "text": text }],
        }),
        Value::Object(_) if output.get("content").is_some() => output,
        Value::Object(_) | Value::Array(_) => json!({
            "content": [{ "type": "text", "text": output.to_string() }],
            "structuredContent": output,
        }),
        other => json!({
            "content": [{ "type": "text", "text": other.to_string() }],
        }),
    }
}
