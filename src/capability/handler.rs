//! Handler capability traits and the call-boundary guard.
//!
//! Handlers are user code. They report failure through [`HandlerError`]; a
//! panic inside a handler is caught by [`guarded`] and turned into a
//! `HandlerError` of kind `panic`, so nothing escapes the dispatcher.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::{Map, Value};

use crate::capability::template::UriParams;

/// Argument map passed to tool and prompt handlers.
pub type Arguments = Map<String, Value>;

/// Result type returned by every handler.
pub type HandlerResult = Result<Value, HandlerError>;

/// A failure reported by a capability handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    kind: String,
    message: String,
}

impl HandlerError {
    /// Kind used when none is given.
    pub const DEFAULT_KIND: &'static str = "handler_error";

    /// Creates an error of the default kind.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(Self::DEFAULT_KIND, message)
    }

    /// Creates an error with an explicit kind, e.g. `"io"` or `"not_found"`.
    #[must_use]
    pub fn with_kind(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// The failure kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HandlerError {}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<std::io::Error> for HandlerError {
    fn from(err: std::io::Error) -> Self {
        Self::with_kind("io", err.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_kind("serialisation", err.to_string())
    }
}

/// Handler invoked by `tools/call` with validated arguments.
pub trait ToolHandler: Send + Sync {
    /// Runs the tool.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] describing why the tool failed.
    fn call(&self, arguments: &Arguments) -> HandlerResult;
}

impl<F> ToolHandler for F
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync,
{
    fn call(&self, arguments: &Arguments) -> HandlerResult {
        self(arguments)
    }
}

/// Handler invoked by `resources/read` with parameters extracted from the URI.
pub trait ResourceHandler: Send + Sync {
    /// Produces the resource content.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] describing why the read failed.
    fn read(&self, params: &UriParams) -> HandlerResult;
}

impl<F> ResourceHandler for F
where
    F: Fn(&UriParams) -> HandlerResult + Send + Sync,
{
    fn read(&self, params: &UriParams) -> HandlerResult {
        self(params)
    }
}

/// Handler invoked by `prompts/get` with the supplied arguments.
pub trait PromptHandler: Send + Sync {
    /// Renders the prompt.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] describing why rendering failed.
    fn render(&self, arguments: &Arguments) -> HandlerResult;
}

impl<F> PromptHandler for F
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync,
{
    fn render(&self, arguments: &Arguments) -> HandlerResult {
        self(arguments)
    }
}

/// Runs a handler call, converting a panic into a `panic` [`HandlerError`].
pub fn guarded<F>(call: F) -> HandlerResult
where
    F: FnOnce() -> HandlerResult,
{
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());
        Err(HandlerError::with_kind("panic", message))
    })
}
