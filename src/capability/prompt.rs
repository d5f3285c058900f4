//! Prompts: definitions, list formatting and rendering.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::capability::handler::{guarded, Arguments, PromptHandler};
use crate::error::DispatchError;

/// A declared prompt argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied.
    pub required: bool,
}

impl PromptArgument {
    /// A required argument.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: true,
        }
    }

    /// An optional argument.
    #[must_use]
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A registered prompt.
#[derive(Clone)]
pub struct Prompt {
    name: String,
    description: Option<String>,
    arguments: Vec<PromptArgument>,
    handler: Arc<dyn PromptHandler>,
}

impl Prompt {
    /// Creates a prompt with no declared arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, handler: impl PromptHandler + 'static) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a declared argument.
    #[must_use]
    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// The prompt name (registry key).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prompt description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared arguments in order.
    #[must_use]
    pub fn arguments(&self) -> &[PromptArgument] {
        &self.arguments
    }

    /// Renders the `prompts/list` entry.
    #[must_use]
    pub fn definition(&self) -> PromptDefinition {
        PromptDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prompt")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// A prompt definition for the `prompts/list` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptDefinition {
    /// Unique prompt name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments.
    pub arguments: Vec<PromptArgument>,
}

/// Checks required arguments, runs the prompt handler and shapes its result.
///
/// # Errors
///
/// - [`DispatchError::MissingRequiredArguments`] listing every absent
///   required argument (the handler is not called)
/// - [`DispatchError::HandlerFailed`] if the handler fails or panics
pub fn render_prompt(prompt: &Prompt, arguments: &Arguments) -> Result<Value, DispatchError> {
    let missing: Vec<String> = prompt
        .arguments
        .iter()
        .filter(|arg| arg.required && !arguments.contains_key(&arg.name))
        .map(|arg| arg.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(DispatchError::MissingRequiredArguments { arguments: missing });
    }

    let output = guarded(|| prompt.handler.render(arguments)).map_err(|source| {
        DispatchError::HandlerFailed {
            capability: format!("prompt '{}'", prompt.name),
            source,
        }
    })?;

    Ok(shape_prompt_result(output, prompt.description()))
}

/// Wraps a handler's raw output into the `prompts/get` result envelope.
///
/// - string → a single user message
/// - array → used as the message list
/// - object with `messages` → passed through unchanged
/// - anything else → its JSON rendering as a single user message
#[must_use]
pub fn shape_prompt_result(output: Value, description: Option<&str>) -> Value {
    let messages = match output {
        Value::Object(_) if output.get("messages").is_some() => return output,
        Value::Array(messages) => Value::Array(messages),
        Value::String(text) => json!([user_message(text)]),
        other => json!([user_message(other.to_string())]),
    };

    let mut result = Map::new();
    if let Some(description) = description {
        result.insert("description".to_string(), json!(description));
    }
    result.insert("messages".to_string(), messages);
    Value::Object(result)
}

fn user_message(text: String) -> Value {
    json!({
        "role": "user",
        "content": { "type": "text", "text": text },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::handler::HandlerResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn greet() -> Prompt {
        Prompt::new("greet", |args: &Arguments| -> HandlerResult {
            let name = args.get("name").and_then(Value::as_str).unwrap_or("there");
            Ok(json!(format!("Say hello to {name}")))
        })
        .with_description("Greets someone")
        .with_argument(PromptArgument::required("name"))
        .with_argument(PromptArgument::optional("tone").with_description("Style"))
    }

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn renders_string_as_user_message() {
        let result = render_prompt(&greet(), &args(json!({"name": "Ada"}))).unwrap();
        assert_eq!(
            result,
            json!({
                "description": "Greets someone",
                "messages": [{
                    "role": "user",
                    "content": { "type": "text", "text": "Say hello to Ada" }
                }]
            })
        );
    }

    #[test]
    fn missing_required_arguments_skip_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let prompt = Prompt::new("pair", move |_: &Arguments| -> HandlerResult {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!(""))
        })
        .with_argument(PromptArgument::required("first"))
        .with_argument(PromptArgument::optional("middle"))
        .with_argument(PromptArgument::required("last"));

        let err = render_prompt(&prompt, &Arguments::new()).unwrap_err();
        assert_eq!(err.kind(), "missing_required_arguments");
        assert_eq!(err.data()["arguments"], json!(["first", "last"]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn list_output_is_message_list() {
        let messages = json!([
            {"role": "user", "content": {"type": "text", "text": "a"}},
            {"role": "assistant", "content": {"type": "text", "text": "b"}}
        ]);
        let shaped = shape_prompt_result(messages.clone(), None);
        assert_eq!(shaped, json!({ "messages": messages }));
    }

    #[test]
    fn pre_shaped_output_passes_through() {
        let pre_shaped = json!({"description": "custom", "messages": []});
        assert_eq!(
            shape_prompt_result(pre_shaped.clone(), Some("ignored")),
            pre_shaped
        );
    }

    #[test]
    fn other_output_is_serialised() {
        let shaped = shape_prompt_result(json!({"topic": "rust"}), None);
        assert_eq!(
            shaped["messages"][0]["content"]["text"],
            r#"{"topic":"rust"}"#
        );
        assert!(shaped.get("description").is_none());
    }

    #[test]
    fn definition_lists_arguments_in_order() {
        let value = serde_json::to_value(greet().definition()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "greet",
                "description": "Greets someone",
                "arguments": [
                    { "name": "name", "required": true },
                    { "name": "tone", "description": "Style", "required": false }
                ]
            })
        );
    }
}
