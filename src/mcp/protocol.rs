//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! This module defines the envelope types used in the Model Context Protocol
//! and the validator that turns raw JSON into a typed [`Message`].
//!
//! # Message Types
//!
//! - **Request**: A message expecting a response (has `id`)
//! - **Notification**: A one-way message (no `id`, or a `notifications/*` method)
//! - **Response**: A successful reply carrying `result`
//! - **Error**: A failed reply carrying `error`
//!
//! # MCP-Specific Constraints
//!
//! - Request IDs must be strings or integers (never `null`)
//! - `params`, when present, must be an object or an array

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::MessageError;

/// The JSON-RPC version every message must carry.
pub const JSONRPC_VERSION: &str = "2.0";

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Method prefix reserved for notifications.
pub const NOTIFICATION_PREFIX: &str = "notifications/";

/// A JSON-RPC 2.0 request ID.
///
/// Per the MCP specification, IDs must be strings or integers, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// Numeric request ID above `i64::MAX`.
    Unsigned(u64),
    /// String request ID.
    String(String),
}

impl RequestId {
    /// Reads an ID from a raw JSON value.
    ///
    /// Returns `None` for anything but a string or an integer.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Number)
                .or_else(|| n.as_u64().map(Self::Unsigned)),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

/// A JSON-RPC 2.0 request message.
///
/// Requests expect a response from the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// Unique request identifier.
    pub id: RequestId,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 notification message.
///
/// Notifications do not expect a response. An `id` sent alongside a
/// `notifications/*` method is kept but never answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcNotification {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The notification method.
    pub method: String,

    /// Optional parameters for the notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,

    /// ID supplied by a client that tagged a notification anyway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to.
    pub id: RequestId,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// Standard JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i64,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self::with_message(code, code.default_message())
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Adds additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to; serialised as `null` when
    /// it could not be determined.
    pub id: Option<RequestId>,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(None, JsonRpcErrorData::from_code(ErrorCode::ParseError))
    }

    /// Creates an internal error response.
    #[must_use]
    pub fn internal_error(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InternalError, message),
        )
    }
}

/// A validated inbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A request expecting a response.
    Request(JsonRpcRequest),
    /// A notification (no response expected).
    Notification(JsonRpcNotification),
    /// A success response from the peer.
    Response(JsonRpcResponse),
    /// An error response from the peer.
    Error(JsonRpcError),
}

impl Message {
    /// Builds a request message.
    #[must_use]
    pub fn request(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> Self {
        Self::Request(JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: id.into(),
            method: method.into(),
            params,
        })
    }

    /// Builds a notification message.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self::Notification(JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
            id: None,
        })
    }

    /// Returns the method name for requests and notifications.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(req) => Some(&req.method),
            Self::Notification(notif) => Some(&notif.method),
            Self::Response(_) | Self::Error(_) => None,
        }
    }

    /// Returns the message ID, if it carries one.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Response(resp) => Some(&resp.id),
            Self::Notification(notif) => notif.id.as_ref(),
            Self::Error(err) => err.id.as_ref(),
        }
    }
}

/// A reply produced by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// Success response.
    Response(JsonRpcResponse),
    /// Error response.
    Error(JsonRpcError),
}

impl OutgoingMessage {
    /// The ID this reply answers.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Response(resp) => Some(&resp.id),
            Self::Error(err) => err.id.as_ref(),
        }
    }

    /// Returns `true` for error responses.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<JsonRpcResponse> for OutgoingMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for OutgoingMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

/// Validates a decoded JSON value as a JSON-RPC 2.0 message.
///
/// # Errors
///
/// Returns the [`MessageError`] describing the first structural problem.
pub fn validate(raw: &Value) -> Result<Message, MessageError> {
    let obj = raw.as_object().ok_or(MessageError::InvalidMessage)?;

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(MessageError::InvalidJsonrpcVersion);
    }

    if let Some(method) = obj.get("method") {
        let method = method
            .as_str()
            .ok_or(MessageError::InvalidMessageType)?
            .to_string();
        let params = validate_params(obj)?;

        let id = obj.get("id");
        if id.is_none() || method.starts_with(NOTIFICATION_PREFIX) {
            return Ok(Message::Notification(JsonRpcNotification {
                jsonrpc: JSONRPC_VERSION,
                method,
                params,
                id: id.and_then(RequestId::from_value),
            }));
        }

        let id = id
            .and_then(RequestId::from_value)
            .ok_or(MessageError::InvalidId)?;
        return Ok(Message::Request(JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }));
    }

    match (obj.get("result"), obj.get("error")) {
        (Some(result), None) => {
            let id = obj
                .get("id")
                .and_then(RequestId::from_value)
                .ok_or(MessageError::InvalidId)?;
            Ok(Message::Response(JsonRpcResponse::success(id, result.clone())))
        }
        (None, Some(error)) => {
            let id = match obj.get("id") {
                None | Some(Value::Null) => None,
                Some(id) => Some(RequestId::from_value(id).ok_or(MessageError::InvalidId)?),
            };
            Ok(Message::Error(JsonRpcError::new(id, validate_error_object(error)?)))
        }
        _ => Err(MessageError::InvalidMessageType),
    }
}

fn validate_params(obj: &Map<String, Value>) -> Result<Option<Value>, MessageError> {
    match obj.get("params") {
        None => Ok(None),
        Some(params @ (Value::Object(_) | Value::Array(_))) => Ok(Some(params.clone())),
        Some(_) => Err(MessageError::InvalidParams),
    }
}

fn validate_error_object(error: &Value) -> Result<JsonRpcErrorData, MessageError> {
    let code = error
        .get("code")
        .and_then(Value::as_i64)
        .ok_or(MessageError::InvalidMessageType)?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .ok_or(MessageError::InvalidMessageType)?;

    Ok(JsonRpcErrorData {
        code,
        message: message.to_string(),
        data: error.get("data").cloned(),
    })
}

/// Parses a JSON string into a validated message.
///
/// # Errors
///
/// Returns a `parse_error` response if the text is not JSON, or an
/// `invalid_request` response (echoing the `id` when it is usable) if the
/// JSON is not a valid message.
pub fn parse_message(json: &str) -> Result<Message, JsonRpcError> {
    let value: Value = serde_json::from_str(json).map_err(|_| JsonRpcError::parse_error())?;

    validate(&value).map_err(|err| {
        let id = value.get("id").and_then(RequestId::from_value);
        err.into_response(id)
    })
}
