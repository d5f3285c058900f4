//! MCP server loop.
//!
//! The server is a single actor: it reads one line at a time from the
//! transport, dispatches it and writes back at most one reply. Registration
//! happens through [`McpServer::dispatcher_mut`] before [`McpServer::run`].
//!
//! Each message is handled on tokio's blocking pool under a timeout, so a
//! slow handler costs its own request an `internal_error` and nothing more.
//! The timed-out handler is left to finish on its thread.

use std::time::Duration;

use tokio::task::spawn_blocking;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::DispatchError;
use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::protocol::{
    parse_message, JsonRpcError, Message, OutgoingMessage, NOTIFICATION_PREFIX,
};
use crate::mcp::transport::StdioTransport;

/// The MCP server.
pub struct McpServer {
    /// Router and capability registry.
    dispatcher: Dispatcher,
    /// The transport layer.
    transport: StdioTransport,
    /// Bound on each handler call.
    handler_timeout: Duration,
}

impl McpServer {
    /// Creates a server with an empty registry, configured from `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_dispatcher(Dispatcher::new(config.server_info()), config.handler_timeout())
    }

    /// Creates a server around an existing dispatcher.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Dispatcher, handler_timeout: Duration) -> Self {
        Self {
            dispatcher,
            transport: StdioTransport::new(),
            handler_timeout,
        }
    }

    /// The dispatcher, for inspection.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The dispatcher, for registering capabilities.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// The configured handler timeout.
    #[must_use]
    pub const fn handler_timeout(&self) -> Duration {
        self.handler_timeout
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        info!(
            tools = self.dispatcher.registry().tool_count(),
            resources = self.dispatcher.registry().resource_count(),
            prompts = self.dispatcher.registry().prompt_count(),
            "Serving capabilities"
        );
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            info!("stdin closed, shutting down");
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        if let Some(reply) = self.process_line(&line).await {
            if let Err(e) = self.transport.write_message(&reply).await {
                error!(error = %e, "Failed to write reply");
                return Err(e);
            }
        }

        Ok(false)
    }

    /// Parses, validates and dispatches one line of input.
    ///
    /// Returns the reply to send, or `None` for notifications and inbound
    /// responses.
    pub async fn process_line(&self, line: &str) -> Option<OutgoingMessage> {
        match parse_message(line) {
            Ok(message) => self.process_message(message).await,
            Err(error) => {
                debug!(code = error.error.code, reason = %error.error.message, "Rejected message");
                Some(error.into())
            }
        }
    }

    /// Dispatches one validated message on the blocking pool, bounded by the
    /// handler timeout.
    pub async fn process_message(&self, message: Message) -> Option<OutgoingMessage> {
        let expects_reply = matches!(
            &message,
            Message::Request(req) if !req.method.starts_with(NOTIFICATION_PREFIX)
        );
        let id = message.id().cloned();
        let method = message.method().map(str::to_string);

        let dispatcher = self.dispatcher.clone();
        let task = spawn_blocking(move || dispatcher.handle(message));

        match timeout(self.handler_timeout, task).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(join_error)) => {
                error!(error = %join_error, method = ?method, "Dispatch task failed");
                expects_reply.then(|| {
                    JsonRpcError::internal_error(id, format!("Dispatch task failed: {join_error}"))
                        .into()
                })
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.handler_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(id = ?id, method = ?method, timeout_ms, "Handler timed out");
                expects_reply
                    .then(|| DispatchError::Timeout { timeout_ms }.into_response(id).into())
            }
        }
    }
}
