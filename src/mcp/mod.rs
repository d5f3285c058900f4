//! Model Context Protocol (MCP) server implementation.
//!
//! This module routes MCP requests to registered tools, resources and
//! prompts. The server communicates over stdio transport using JSON-RPC 2.0
//! messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │  Transport  │───▶│  Protocol   │───▶│  Dispatcher  │     │
//! │   │   (stdio)   │    │ (validate)  │    │  (routing)   │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! │          ▲                                     │             │
//! │          │                                     ▼             │
//! │          │                            ┌──────────────────┐   │
//! │          └────────────────────────────│ Capability       │   │
//! │                  reply                │ registry         │   │
//! │                                       └──────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod dispatcher;
pub mod method;
pub mod protocol;
pub mod server;
pub mod transport;

pub use dispatcher::{Dispatcher, ServerInfo};
pub use method::Method;
pub use protocol::{
    parse_message, validate, JsonRpcError, JsonRpcRequest, JsonRpcResponse, Message,
    OutgoingMessage, RequestId, MCP_PROTOCOL_VERSION,
};
pub use server::McpServer;
pub use transport::StdioTransport;
