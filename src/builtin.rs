//! Capabilities registered by the `mcp-dispatch` binary.
//!
//! - `echo` tool: returns its `text` argument
//! - `add` tool: sums two numbers, keeping integers integral
//! - `server://info/{field}` resource: `name`, `version` or `protocol`
//! - `summarize` prompt: asks the model to summarise `text`

use serde_json::{json, Value};

use crate::capability::{
    Arguments, HandlerError, HandlerResult, Prompt, PromptArgument, Resource, Tool, UriParams,
};
use crate::error::DefinitionError;
use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::MCP_PROTOCOL_VERSION;
use crate::schema::{SchemaNode, SchemaType};

/// Registers the built-in tools, resource and prompt.
///
/// # Errors
///
/// Returns a [`DefinitionError`] if a built-in definition is rejected.
pub fn register_builtin_capabilities(dispatcher: &mut Dispatcher) -> Result<(), DefinitionError> {
    dispatcher.register_tool(echo_tool()?);
    dispatcher.register_tool(add_tool()?);
    dispatcher.register_resource(server_info_resource(dispatcher)?);
    dispatcher.register_prompt(summarize_prompt());
    Ok(())
}

fn echo_tool() -> Result<Tool, DefinitionError> {
    Tool::new(
        "echo",
        "Returns the given text unchanged",
        SchemaNode::object().required_property(
            "text",
            SchemaNode::string().with_description("Text to echo back"),
        ),
        |args: &Arguments| -> HandlerResult {
            Ok(args.get("text").cloned().unwrap_or_default())
        },
    )
}

fn add_tool() -> Result<Tool, DefinitionError> {
    Tool::new(
        "add",
        "Adds two numbers",
        SchemaNode::from_field_types([("a", SchemaType::Number), ("b", SchemaType::Number)]),
        |args: &Arguments| -> HandlerResult {
            add(
                args.get("a").unwrap_or(&Value::Null),
                args.get("b").unwrap_or(&Value::Null),
            )
        },
    )
}

fn add(a: &Value, b: &Value) -> HandlerResult {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a
            .checked_add(b)
            .map(Value::from)
            .ok_or_else(|| HandlerError::with_kind("overflow", "integer overflow"));
    }

    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => Ok(json!(a + b)),
        _ => Err(HandlerError::with_kind("type_error", "operands must be numbers")),
    }
}

fn server_info_resource(dispatcher: &Dispatcher) -> Result<Resource, DefinitionError> {
    let info = dispatcher.server_info().clone();
    Resource::new(
        "server://info/{field}",
        "Server information",
        move |params: &UriParams| -> HandlerResult {
            match params.get("field").map_or("", String::as_str) {
                "name" => Ok(json!(info.name)),
                "version" => Ok(json!(info.version)),
                "protocol" => Ok(json!(MCP_PROTOCOL_VERSION)),
                other => Err(HandlerError::with_kind(
                    "not_found",
                    format!("unknown field '{other}'"),
                )),
            }
        },
    )
    .map(|resource| resource.with_description("Server name, version or protocol by field"))
}

fn summarize_prompt() -> Prompt {
    Prompt::new("summarize", |args: &Arguments| -> HandlerResult {
        let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
        let style = args
            .get("style")
            .and_then(Value::as_str)
            .unwrap_or("concise");
        Ok(json!(format!(
            "Write a {style} summary of the following text:\n\n{text}"
        )))
    })
    .with_description("Asks for a summary of a piece of text")
    .with_argument(PromptArgument::required("text").with_description("Text to summarise"))
    .with_argument(
        PromptArgument::optional("style").with_description("Summary style, e.g. bullet points"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::dispatcher::ServerInfo;

    fn dispatcher() -> Dispatcher {
        let mut dispatcher = Dispatcher::new(ServerInfo {
            name: "builtin-test".to_string(),
            version: "9.9.9".to_string(),
        });
        register_builtin_capabilities(&mut dispatcher).unwrap();
        dispatcher
    }

    #[test]
    fn registers_everything() {
        let dispatcher = dispatcher();
        let registry = dispatcher.registry();
        assert_eq!(registry.tool_count(), 2);
        assert_eq!(registry.resource_count(), 1);
        assert_eq!(registry.prompt_count(), 1);
    }

    #[test]
    fn add_keeps_integers_integral() {
        assert_eq!(add(&json!(2), &json!(3)).unwrap(), json!(5));
        assert_eq!(add(&json!(2.5), &json!(1)).unwrap(), json!(3.5));
        assert_eq!(
            add(&json!(i64::MAX), &json!(1)).unwrap_err().kind(),
            "overflow"
        );
    }

    #[test]
    fn info_resource_reads_fields() {
        let dispatcher = dispatcher();
        let resource = dispatcher
            .registry()
            .resolve_resource("server://info/version")
            .unwrap();
        let result = crate::capability::read_resource(resource, "server://info/version").unwrap();
        assert_eq!(result["contents"][0]["text"], "9.9.9");

        let err = crate::capability::read_resource(resource, "server://info/colour").unwrap_err();
        assert_eq!(err.data()["errorKind"], "not_found");
    }
}
