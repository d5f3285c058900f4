//! mcp-dispatch: a Model Context Protocol server runtime
//!
//! This library accepts JSON-RPC 2.0 messages, routes them to user-registered
//! tools, resources and prompts, validates inputs against declared schemas
//! and returns correctly shaped MCP responses or errors.
//!
//! # Architecture
//!
//! The dispatch engine is transport-agnostic: one validated message in, at
//! most one reply out.
//!
//! - **Message validation**: JSON-RPC envelopes become typed [`mcp::Message`]s
//! - **Routing**: a fixed method table resolved once into [`mcp::Method`]
//! - **Capabilities**: tools, resources and prompts with user handlers
//! - **Schema validation**: tool arguments checked before the handler runs
//! - **URI templates**: `{param}` resource addresses with extracted values
//!
//! # Example
//!
//! ```
//! use mcp_dispatch::capability::{Arguments, HandlerResult, Tool};
//! use mcp_dispatch::mcp::{Dispatcher, Message, OutgoingMessage, ServerInfo};
//! use mcp_dispatch::schema::{SchemaNode, SchemaType};
//! use serde_json::{json, Value};
//!
//! let mut dispatcher = Dispatcher::new(ServerInfo::default());
//! dispatcher.register_tool(
//!     Tool::new(
//!         "add",
//!         "Adds two integers",
//!         SchemaNode::from_field_types([("a", SchemaType::Integer), ("b", SchemaType::Integer)]),
//!         |args: &Arguments| -> HandlerResult {
//!             let a = args.get("a").and_then(Value::as_i64).unwrap_or_default();
//!             let b = args.get("b").and_then(Value::as_i64).unwrap_or_default();
//!             Ok(json!(a + b))
//!         },
//!     )
//!     .unwrap(),
//! );
//!
//! let request = Message::request(
//!     1_i64,
//!     "tools/call",
//!     Some(json!({"name": "add", "arguments": {"a": 2, "b": 3}})),
//! );
//! let Some(OutgoingMessage::Response(response)) = dispatcher.handle(request) else {
//!     panic!("expected a response");
//! };
//! assert_eq!(response.result["content"][0]["text"], "5");
//! ```
//!
//! # Modules
//!
//! - [`builtin`] — Capabilities shipped with the binary
//! - [`capability`] — Tools, resources, prompts and the registry
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol, dispatcher, server loop and transport
//! - [`schema`] — Argument schema descriptors and validation

pub mod builtin;
pub mod capability;
pub mod config;
pub mod error;
pub mod mcp;
pub mod schema;
