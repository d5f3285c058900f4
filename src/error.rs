//! Error types for mcp-dispatch.
//!
//! Protocol-facing errors ([`MessageError`], [`SchemaError`], [`DispatchError`])
//! each know the JSON-RPC error code they map to, a stable snake_case `kind`
//! tag, and the structured `data` a client needs to correct its request.

use std::path::PathBuf;

use serde_json::{json, Value};
use thiserror::Error;

use crate::capability::HandlerError;
use crate::mcp::protocol::{ErrorCode, JsonRpcError, JsonRpcErrorData, RequestId};
use crate::schema::SchemaType;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Structural problems with an inbound JSON-RPC envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The payload is not a JSON object.
    #[error("message must be a JSON object")]
    InvalidMessage,

    /// The `jsonrpc` member is missing or not exactly `"2.0"`.
    #[error("jsonrpc field must be \"2.0\"")]
    InvalidJsonrpcVersion,

    /// The message is neither a request, a response nor an error response.
    #[error("message must contain a string method, a result or an error")]
    InvalidMessageType,

    /// A request id that is neither a string nor an integer.
    #[error("id must be a string or an integer")]
    InvalidId,

    /// `params` present but not structured.
    #[error("params must be an object or an array")]
    InvalidParams,
}

impl MessageError {
    /// Returns the stable tag for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "invalid_message",
            Self::InvalidJsonrpcVersion => "invalid_jsonrpc_version",
            Self::InvalidMessageType => "invalid_message_type",
            Self::InvalidId => "invalid_id",
            Self::InvalidParams => "invalid_params",
        }
    }

    /// Converts this error into an `invalid_request` response.
    #[must_use]
    pub fn into_response(self, id: Option<RequestId>) -> JsonRpcError {
        JsonRpcError::new(
            id,
            JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, self.to_string())
                .with_data(json!({ "kind": self.kind() })),
        )
    }
}

/// Rejected capability definitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Tool input schemas must describe an object.
    #[error("input schema of tool '{tool}' must be of type object, got {actual}")]
    NonObjectInputSchema {
        /// Tool name.
        tool: String,
        /// The schema type that was supplied.
        actual: SchemaType,
    },

    /// Malformed resource URI template.
    #[error("invalid URI template '{template}': {reason}")]
    InvalidUriTemplate {
        /// The offending template.
        template: String,
        /// Description of what's wrong.
        reason: String,
    },

    /// A schema `pattern` is not a valid regular expression.
    #[error("invalid schema pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler error text.
        reason: String,
    },
}

/// Schema validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Value has the wrong primitive kind.
    #[error("type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Location of the value (`$` is the root).
        path: String,
        /// Type declared by the schema.
        expected: SchemaType,
        /// JSON type actually found.
        actual: &'static str,
    },

    /// Required object members are absent.
    #[error("missing required fields at {path}: {}", .fields.join(", "))]
    MissingRequiredFields {
        /// Location of the object.
        path: String,
        /// Names of the missing members, in declared order.
        fields: Vec<String>,
    },

    /// A constraint enforced by strict validation failed.
    #[error("constraint {constraint} violated at {path}: {message}")]
    ConstraintViolation {
        /// Location of the value.
        path: String,
        /// Constraint keyword, e.g. `maxLength`.
        constraint: &'static str,
        /// Description of the violation.
        message: String,
    },
}

impl SchemaError {
    /// Returns the stable tag for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::MissingRequiredFields { .. } => "missing_required_fields",
            Self::ConstraintViolation { .. } => "constraint_violation",
        }
    }

    /// Structured detail for the error response.
    #[must_use]
    pub fn data(&self) -> Value {
        match self {
            Self::TypeMismatch {
                path,
                expected,
                actual,
            } => json!({
                "kind": self.kind(),
                "path": path,
                "expected": expected,
                "actual": actual,
            }),
            Self::MissingRequiredFields { path, fields } => json!({
                "kind": self.kind(),
                "path": path,
                "fields": fields,
            }),
            Self::ConstraintViolation {
                path, constraint, ..
            } => json!({
                "kind": self.kind(),
                "path": path,
                "constraint": constraint,
            }),
        }
    }
}

/// Errors produced while routing and executing a request.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The method is not in the routing table.
    #[error("Unknown method: {method}")]
    UnknownMethod {
        /// Method name as received.
        method: String,
    },

    /// No tool registered under this name.
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },

    /// No prompt registered under this name.
    #[error("Unknown prompt: {name}")]
    UnknownPrompt {
        /// Requested prompt name.
        name: String,
    },

    /// No resource template matches the URI.
    #[error("No resource matches URI: {uri}")]
    UriNotMatched {
        /// Requested URI.
        uri: String,
    },

    /// Method params are malformed.
    #[error("Invalid params: {message}")]
    InvalidParams {
        /// Description of what's wrong.
        message: String,
    },

    /// Tool arguments failed schema validation.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] SchemaError),

    /// Required prompt arguments are absent.
    #[error("Missing required arguments: {}", .arguments.join(", "))]
    MissingRequiredArguments {
        /// Names of the missing arguments, in declared order.
        arguments: Vec<String>,
    },

    /// A user handler failed or panicked.
    #[error("{capability} failed: {source}")]
    HandlerFailed {
        /// Which capability failed, e.g. `tool 'add'`.
        capability: String,
        /// The handler's failure.
        #[source]
        source: HandlerError,
    },

    /// The handler did not finish within the configured bound.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout {
        /// The bound that expired.
        timeout_ms: u64,
    },

    /// Result could not be serialised.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of what's wrong.
        message: String,
    },
}

impl DispatchError {
    /// Returns the JSON-RPC error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownMethod { .. }
            | Self::UnknownTool { .. }
            | Self::UnknownPrompt { .. }
            | Self::UriNotMatched { .. } => ErrorCode::MethodNotFound,
            Self::InvalidParams { .. }
            | Self::InvalidArguments(_)
            | Self::MissingRequiredArguments { .. } => ErrorCode::InvalidParams,
            Self::HandlerFailed { .. } | Self::Timeout { .. } | Self::Internal { .. } => {
                ErrorCode::InternalError
            }
        }
    }

    /// Returns the stable tag for this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownMethod { .. } => "unknown_method",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::UnknownPrompt { .. } => "unknown_prompt",
            Self::UriNotMatched { .. } => "uri_not_matched",
            Self::InvalidParams { .. } => "invalid_params",
            Self::InvalidArguments(err) => err.kind(),
            Self::MissingRequiredArguments { .. } => "missing_required_arguments",
            Self::HandlerFailed { .. } => "handler_failed",
            Self::Timeout { .. } => "timeout",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Structured detail for the error response.
    #[must_use]
    pub fn data(&self) -> Value {
        match self {
            Self::UnknownMethod { method } => json!({ "kind": self.kind(), "method": method }),
            Self::UnknownTool { name } | Self::UnknownPrompt { name } => {
                json!({ "kind": self.kind(), "name": name })
            }
            Self::UriNotMatched { uri } => json!({ "kind": self.kind(), "uri": uri }),
            Self::InvalidArguments(err) => err.data(),
            Self::MissingRequiredArguments { arguments } => {
                json!({ "kind": self.kind(), "arguments": arguments })
            }
            Self::HandlerFailed { source, .. } => json!({
                "kind": self.kind(),
                "errorKind": source.kind(),
            }),
            Self::Timeout { timeout_ms } => json!({ "kind": self.kind(), "timeoutMs": timeout_ms }),
            Self::InvalidParams { .. } | Self::Internal { .. } => json!({ "kind": self.kind() }),
        }
    }

    /// Converts this error into an error response for `id`.
    #[must_use]
    pub fn into_response(self, id: Option<RequestId>) -> JsonRpcError {
        let data = self.data();
        JsonRpcError::new(
            id,
            JsonRpcErrorData::with_message(self.code(), self.to_string()).with_data(data),
        )
    }
}
