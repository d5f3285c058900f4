//! Method routing for validated MCP messages.
//!
//! The [`Dispatcher`] owns the capability registry and turns each inbound
//! [`Message`] into at most one reply. Every failure, including a panicking
//! handler, ends up as an error response for the request that caused it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::capability::{
    execute_tool, read_resource, render_prompt, Arguments, Prompt, Registry, Resource, Tool,
};
use crate::error::DispatchError;
use crate::mcp::method::Method;
use crate::mcp::protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Message, OutgoingMessage,
    MCP_PROTOCOL_VERSION, NOTIFICATION_PREFIX,
};

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ListCapability,
    /// Resource-related capabilities.
    pub resources: ResourceCapabilities,
    /// Prompt-related capabilities.
    pub prompts: ListCapability,
}

/// Capability whose only feature is list change notifications.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCapability {
    /// Whether the list can change during the session.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Resource-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCapabilities {
    /// Whether clients may subscribe to resource updates.
    pub subscribe: bool,
    /// Whether the resource list can change during the session.
    pub list_changed: bool,
}

/// Server information for initialisation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Option<Arguments>,
}

/// Parameters for resources/read request.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceReadParams {
    /// Concrete URI to read.
    pub uri: String,
}

/// Parameters for prompts/get request.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptGetParams {
    /// Name of the prompt to render.
    pub name: String,
    /// Arguments for the prompt.
    #[serde(default)]
    pub arguments: Option<Arguments>,
}

/// Routes messages to registered capabilities.
///
/// Cloning is cheap: the registry sits behind an [`Arc`] and is copied only
/// when a clone that shares it registers something new.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    server_info: ServerInfo,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty registry.
    #[must_use]
    pub fn new(server_info: ServerInfo) -> Self {
        Self {
            registry: Arc::default(),
            server_info,
        }
    }

    /// Registers a tool, returning the entry it replaced.
    pub fn register_tool(&mut self, tool: Tool) -> Option<Tool> {
        debug!(tool = tool.name(), "Registering tool");
        Arc::make_mut(&mut self.registry).register_tool(tool)
    }

    /// Registers a resource, returning the entry it replaced.
    pub fn register_resource(&mut self, resource: Resource) -> Option<Resource> {
        debug!(uri = resource.uri(), "Registering resource");
        Arc::make_mut(&mut self.registry).register_resource(resource)
    }

    /// Registers a prompt, returning the entry it replaced.
    pub fn register_prompt(&mut self, prompt: Prompt) -> Option<Prompt> {
        debug!(prompt = prompt.name(), "Registering prompt");
        Arc::make_mut(&mut self.registry).register_prompt(prompt)
    }

    /// The current registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The identity reported by `initialize`.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Handles any validated message, returning the reply to send (if any).
    ///
    /// Failed notifications are logged and produce no reply.
    #[must_use]
    pub fn handle(&self, message: Message) -> Option<OutgoingMessage> {
        match message {
            Message::Request(req) if req.method.starts_with(NOTIFICATION_PREFIX) => {
                let notification = JsonRpcNotification {
                    jsonrpc: req.jsonrpc,
                    method: req.method,
                    params: req.params,
                    id: Some(req.id),
                };
                self.handle_notification(&notification);
                None
            }
            Message::Request(req) => Some(self.dispatch_request(&req)),
            Message::Notification(notification) => {
                self.handle_notification(&notification);
                None
            }
            Message::Response(resp) => {
                debug!(id = %resp.id, "Ignoring inbound response");
                None
            }
            Message::Error(err) => {
                debug!(id = ?err.id, code = err.error.code, "Ignoring inbound error response");
                None
            }
        }
    }

    /// Routes a request and always produces a reply carrying its id.
    #[must_use]
    pub fn dispatch_request(&self, req: &JsonRpcRequest) -> OutgoingMessage {
        let method = Method::parse(&req.method);
        debug!(id = %req.id, method = %method, "Dispatching request");

        match self.route(&method, req.params.as_ref()) {
            Ok(result) => JsonRpcResponse::success(req.id.clone(), result).into(),
            Err(err) => {
                debug!(id = %req.id, kind = err.kind(), error = %err, "Request failed");
                err.into_response(Some(req.id.clone())).into()
            }
        }
    }

    /// Processes a notification. Nothing is ever sent back; the outcome is
    /// returned so the caller can log it.
    ///
    /// # Errors
    ///
    /// Returns the [`DispatchError`] of an id-less call to a routable method,
    /// or [`DispatchError::UnknownMethod`] for an id-less message outside the
    /// method table.
    pub fn dispatch_notification(
        &self,
        notification: &JsonRpcNotification,
    ) -> Result<(), DispatchError> {
        match Method::parse(&notification.method) {
            Method::Initialized => {
                info!("Client initialised");
                Ok(())
            }
            Method::Cancelled => {
                let request_id = notification
                    .params
                    .as_ref()
                    .and_then(|p| p.get("requestId"))
                    .cloned()
                    .unwrap_or(Value::Null);
                info!(request_id = %request_id, "Client cancelled request");
                Ok(())
            }
            Method::Unknown(name) if name.starts_with(NOTIFICATION_PREFIX) => {
                debug!(method = %name, "Ignoring notification");
                Ok(())
            }
            method => {
                debug!(method = %method, "Executing id-less call, result discarded");
                self.route(&method, notification.params.as_ref()).map(drop)
            }
        }
    }

    fn handle_notification(&self, notification: &JsonRpcNotification) {
        if let Err(err) = self.dispatch_notification(notification) {
            warn!(
                method = %notification.method,
                kind = err.kind(),
                error = %err,
                "Notification failed"
            );
        }
    }

    fn route(&self, method: &Method, params: Option<&Value>) -> Result<Value, DispatchError> {
        match method {
            Method::Initialize => Ok(self.initialize_result()),
            Method::Ping => Ok(json!({})),
            Method::ToolsList => Ok(json!({ "tools": self.registry.tool_definitions() })),
            Method::ToolsCall => {
                let params: ToolCallParams = parse_params(method, params)?;
                let tool = self
                    .registry
                    .tool(&params.name)
                    .ok_or(DispatchError::UnknownTool { name: params.name })?;
                execute_tool(tool, &params.arguments.unwrap_or_default())
            }
            Method::ResourcesList => {
                Ok(json!({ "resources": self.registry.resource_definitions() }))
            }
            Method::ResourcesRead => {
                let params: ResourceReadParams = parse_params(method, params)?;
                let resource = self.registry.resolve_resource(&params.uri).ok_or_else(|| {
                    DispatchError::UriNotMatched {
                        uri: params.uri.clone(),
                    }
                })?;
                read_resource(resource, &params.uri)
            }
            Method::PromptsList => Ok(json!({ "prompts": self.registry.prompt_definitions() })),
            Method::PromptsGet => {
                let params: PromptGetParams = parse_params(method, params)?;
                let prompt = self
                    .registry
                    .prompt(&params.name)
                    .ok_or(DispatchError::UnknownPrompt { name: params.name })?;
                render_prompt(prompt, &params.arguments.unwrap_or_default())
            }
            Method::Initialized | Method::Cancelled | Method::Unknown(_) => {
                Err(DispatchError::UnknownMethod {
                    method: method.to_string(),
                })
            }
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": self.server_info,
        })
    }
}

fn parse_params<T: DeserializeOwned>(
    method: &Method,
    params: Option<&Value>,
) -> Result<T, DispatchError> {
    let params = params.ok_or_else(|| DispatchError::InvalidParams {
        message: format!("Missing {method} params"),
    })?;

    serde_json::from_value(params.clone()).map_err(|e| DispatchError::InvalidParams {
        message: format!("Invalid {method} params: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{HandlerError, HandlerResult, PromptArgument, UriParams};
    use crate::mcp::protocol::{ErrorCode, RequestId};
    use crate::schema::{SchemaNode, SchemaType};

    fn dispatcher() -> Dispatcher {
        let mut dispatcher = Dispatcher::new(ServerInfo {
            name: "test-server".to_string(),
            version: "0.0.1".to_string(),
        });
        dispatcher.register_tool(
            Tool::new(
                "add",
                "Adds two integers",
                SchemaNode::from_field_types([("a", SchemaType::Integer), ("b", SchemaType::Integer)]),
                |args: &Arguments| -> HandlerResult {
                    let a = args["a"].as_i64().unwrap_or_default();
                    let b = args["b"].as_i64().unwrap_or_default();
                    Ok(json!(a + b))
                },
            )
            .unwrap(),
        );
        dispatcher.register_tool(
            Tool::new("boom", "Panics", SchemaNode::object(), |_: &Arguments| -> HandlerResult {
                panic!("kaboom")
            })
            .unwrap(),
        );
        dispatcher.register_resource(
            Resource::new("user://{user_id}/profile", "Profile", |p: &UriParams| -> HandlerResult {
                Ok(json!(format!("user {}", p["user_id"])))
            })
            .unwrap(),
        );
        dispatcher.register_prompt(
            Prompt::new("greet", |_: &Arguments| -> HandlerResult { Ok(json!("hi")) })
                .with_argument(PromptArgument::required("name")),
        );
        dispatcher
    }

    fn request(method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0",
            id: RequestId::Number(1),
            method: method.to_string(),
            params,
        }
    }

    fn result_of(reply: OutgoingMessage) -> Value {
        match reply {
            OutgoingMessage::Response(resp) => resp.result,
            OutgoingMessage::Error(err) => panic!("Expected success, got {err:?}"),
        }
    }

    fn error_of(reply: OutgoingMessage) -> (i64, Value) {
        match reply {
            OutgoingMessage::Error(err) => (err.error.code, err.error.data.unwrap_or(Value::Null)),
            OutgoingMessage::Response(resp) => panic!("Expected error, got {resp:?}"),
        }
    }

    #[test]
    fn initialize_reports_identity() {
        let result = result_of(dispatcher().dispatch_request(&request("initialize", None)));
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["capabilities"]["resources"]["subscribe"], false);
    }

    #[test]
    fn ping_returns_empty_object() {
        assert_eq!(result_of(dispatcher().dispatch_request(&request("ping", None))), json!({}));
    }

    #[test]
    fn unknown_method() {
        let reply = dispatcher().dispatch_request(&request("foo/bar", None));
        assert_eq!(reply.id(), Some(&RequestId::Number(1)));
        let OutgoingMessage::Error(err) = reply else {
            panic!("Expected error");
        };
        assert_eq!(err.error.code, ErrorCode::MethodNotFound.code());
        assert_eq!(err.error.message, "Unknown method: foo/bar");
    }

    #[test]
    fn lists_echo_id_and_registry() {
        let dispatcher = dispatcher();
        let reply = dispatcher.dispatch_request(&request("tools/list", None));
        assert_eq!(reply.id(), Some(&RequestId::Number(1)));
        let tools = result_of(reply)["tools"].clone();
        assert_eq!(tools[0]["name"], "add");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["a", "b"]));

        let resources = result_of(dispatcher.dispatch_request(&request("resources/list", None)));
        assert_eq!(resources["resources"][0]["mimeType"], "text/plain");
        assert!(resources["resources"][0].get("description").is_none());
    }

    #[test]
    fn tools_call_validates_before_calling() {
        let reply = dispatcher().dispatch_request(&request(
            "tools/call",
            Some(json!({"name": "add", "arguments": {"a": 2}})),
        ));
        let (code, data) = error_of(reply);
        assert_eq!(code, ErrorCode::InvalidParams.code());
        assert_eq!(data["fields"], json!(["b"]));
    }

    #[test]
    fn unknown_tool_is_method_not_found() {
        let reply = dispatcher()
            .dispatch_request(&request("tools/call", Some(json!({"name": "nope"}))));
        let (code, data) = error_of(reply);
        assert_eq!(code, ErrorCode::MethodNotFound.code());
        assert_eq!(data["kind"], "unknown_tool");
    }

    #[test]
    fn malformed_params_are_invalid_params() {
        let dispatcher = dispatcher();
        for params in [
            None,
            Some(json!({})),
            Some(json!({"name": "add", "arguments": [1, 2]})),
        ] {
            let (code, data) = error_of(dispatcher.dispatch_request(&request("tools/call", params)));
            assert_eq!(code, ErrorCode::InvalidParams.code());
            assert_eq!(data["kind"], "invalid_params");
        }
    }

    #[test]
    fn panicking_handler_becomes_internal_error() {
        let reply =
            dispatcher().dispatch_request(&request("tools/call", Some(json!({"name": "boom"}))));
        let (code, data) = error_of(reply);
        assert_eq!(code, ErrorCode::InternalError.code());
        assert_eq!(data["errorKind"], "panic");
    }

    #[test]
    fn resources_read_resolves_templates() {
        let dispatcher = dispatcher();
        let result = result_of(dispatcher.dispatch_request(&request(
            "resources/read",
            Some(json!({"uri": "user://42/profile"})),
        )));
        assert_eq!(result["contents"][0]["text"], "user 42");

        let (code, data) = error_of(dispatcher.dispatch_request(&request(
            "resources/read",
            Some(json!({"uri": "order://99"})),
        )));
        assert_eq!(code, ErrorCode::MethodNotFound.code());
        assert_eq!(data["kind"], "uri_not_matched");
    }

    #[test]
    fn prompts_get_reports_missing_arguments() {
        let (code, data) = error_of(
            dispatcher().dispatch_request(&request("prompts/get", Some(json!({"name": "greet"})))),
        );
        assert_eq!(code, ErrorCode::InvalidParams.code());
        assert_eq!(data["arguments"], json!(["name"]));
    }

    #[test]
    fn notifications_never_reply() {
        let dispatcher = dispatcher();
        assert!(dispatcher
            .handle(Message::notification("notifications/initialized", None))
            .is_none());
        assert!(dispatcher
            .handle(Message::notification("notifications/whatever", None))
            .is_none());
        assert!(dispatcher
            .handle(Message::request(5_i64, "notifications/cancelled", None))
            .is_none());
    }

    #[test]
    fn idless_calls_run_and_report_failures() {
        let dispatcher = dispatcher();
        let notification = |method: &str, params: Option<Value>| JsonRpcNotification {
            jsonrpc: "2.0",
            method: method.to_string(),
            params,
            id: None,
        };

        assert!(dispatcher.dispatch_notification(&notification("ping", None)).is_ok());
        let err = dispatcher
            .dispatch_notification(&notification(
                "tools/call",
                Some(json!({"name": "add", "arguments": {}})),
            ))
            .unwrap_err();
        assert_eq!(err.kind(), "missing_required_fields");
        let err = dispatcher
            .dispatch_notification(&notification("bogus", None))
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnknownMethod { .. }));
    }

    #[test]
    fn inbound_responses_are_ignored() {
        let dispatcher = dispatcher();
        let response = JsonRpcResponse::success(RequestId::Number(3), json!({}));
        assert!(dispatcher.handle(Message::Response(response)).is_none());
    }

    #[test]
    fn registration_after_clone_does_not_leak() {
        let original = dispatcher();
        let mut copy = original.clone();
        copy.register_tool(
            Tool::new("extra", "", SchemaNode::object(), |_: &Arguments| -> HandlerResult {
                Err(HandlerError::new("unused"))
            })
            .unwrap(),
        );
        assert_eq!(copy.registry().tool_count(), 3);
        assert_eq!(original.registry().tool_count(), 2);
    }
}
