//! MCP Server builder utilities.
//!
//! This module provides a consistent pattern for building and running MCP servers
//! with support for multiple transport modes and graceful shutdown.
//!
//! # Example
//!
//! ```ignore
//! use openai_image_mcp_common::lifecycle::Lifecycle;
//! use openai_image_mcp_common::server::McpServerBuilder;
//! use openai_image_mcp_common::transport::Transport;
//!
//! let lifecycle = Lifecycle::new();
//! McpServerBuilder::new(handler)
//!     .with_transport(Transport::stdio())
//!     .with_lifecycle(lifecycle)
//!     .run()
//!     .await?;
//! ```

use crate::framing::{self, MessageSink, MessageStream};
use crate::lifecycle::Lifecycle;
use crate::transport::Transport;
use rmcp::service::{RoleServer, RxJsonRpcMessage, TxJsonRpcMessage};
use rmcp::{ServerHandler, ServiceExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

/// Errors that can occur when running an MCP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified port
    #[error("Failed to bind to port {port}: {message}")]
    BindFailed { port: u16, message: String },

    /// Transport error during communication
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Builder for configuring and running MCP servers.
pub struct McpServerBuilder<H> {
    handler: H,
    transport: Transport,
    shutdown_rx: Option<oneshot::Receiver<()>>,
    lifecycle: Lifecycle,
}

impl<H> McpServerBuilder<H>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    /// Create a new server builder with the given handler.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            transport: Transport::default(),
            shutdown_rx: None,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Set the transport mode for the server.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Set a shutdown signal receiver for graceful shutdown.
    ///
    /// When the sender is dropped or a message is sent, the server
    /// will initiate graceful shutdown instead of waiting for SIGINT/SIGTERM.
    pub fn with_shutdown(mut self, shutdown_rx: oneshot::Receiver<()>) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    /// Share a lifecycle with the handler so both observe the same state.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Run the MCP server with the configured transport.
    ///
    /// Returns once the client disconnects or a shutdown signal arrives; the
    /// lifecycle is `Terminated` afterwards.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(transport = %self.transport, "Starting MCP server");

        match self.transport {
            Transport::Stdio => {
                let (sink, stream) = framing::stdio();
                self.serve_lines(sink, stream).await
            }
            Transport::Http { port } => self.run_http(port).await,
        }
    }

    /// Serve one client over an arbitrary line-delimited byte stream pair.
    ///
    /// This is the stdio transport with the process streams swapped for
    /// `reader`/`writer`, e.g. a `tokio::io::duplex` pipe or a socket.
    pub async fn run_on<R, W>(self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.serve_lines(framing::encode_lines(writer), framing::decode_lines(reader))
            .await
    }

    async fn serve_lines(
        self,
        sink: MessageSink<TxJsonRpcMessage<RoleServer>>,
        stream: MessageStream<RxJsonRpcMessage<RoleServer>>,
    ) -> Result<(), ServerError> {
        let lifecycle = self.lifecycle.clone();
        let handler = self.handler;

        let session = async move {
            let service = handler
                .serve((sink, stream))
                .await
                .map_err(|e| ServerError::Transport(e.to_string()))?;
            service
                .waiting()
                .await
                .map_err(|e| ServerError::Transport(e.to_string()))?;
            Ok::<_, ServerError>(())
        };

        let result = tokio::select! {
            result = session => {
                tracing::info!("Client disconnected, stopping server");
                lifecycle.begin_shutdown();
                result
            }
            _ = shutdown_requested(self.shutdown_rx, &lifecycle) => {
                tracing::info!("Received shutdown signal, stopping server");
                Ok(())
            }
        };

        // Dropping the session above closed the transport and abandoned any
        // in-flight request; files already written stay on disk.
        lifecycle.terminate();
        result
    }

    /// Run the server with HTTP streamable transport.
    async fn run_http(self, port: u16) -> Result<(), ServerError> {
        use rmcp::transport::streamable_http_server::{
            session::local::LocalSessionManager, StreamableHttpService,
        };

        let handler = self.handler.clone();
        let service = StreamableHttpService::new(
            move || Ok(handler.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        let router = axum::Router::new().nest_service("/mcp", service);

        let bind_addr = format!("0.0.0.0:{}", port);
        let tcp_listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServerError::BindFailed {
                port,
                message: e.to_string(),
            })?;

        tracing::info!(port, "HTTP server listening");

        let lifecycle = self.lifecycle.clone();
        let shutdown_rx = self.shutdown_rx;
        let shutdown_lifecycle = lifecycle.clone();

        let result = axum::serve(tcp_listener, router)
            .with_graceful_shutdown(async move {
                shutdown_requested(shutdown_rx, &shutdown_lifecycle).await;
            })
            .await
            .map_err(|e| ServerError::Transport(e.to_string()));

        lifecycle.begin_shutdown();
        lifecycle.terminate();
        tracing::info!("HTTP server stopped");
        result
    }
}

/// Resolve once shutdown is requested, moving the lifecycle to `ShuttingDown`.
///
/// This is the only place a signal turns into a lifecycle transition.
async fn shutdown_requested(shutdown_rx: Option<oneshot::Receiver<()>>, lifecycle: &Lifecycle) {
    match shutdown_rx {
        Some(rx) => {
            let _ = rx.await;
        }
        None => wait_for_shutdown_signal().await,
    }
    lifecycle.begin_shutdown();
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!(error = %e, "Failed to register signal handlers");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to register Ctrl+C handler");
            return std::future::pending().await;
        }
        tracing::info!("Received Ctrl+C");
    }
}

/// Convenience function to set up graceful shutdown handling.
///
/// Returns a sender that can be used to trigger shutdown programmatically,
/// and a receiver to pass to the server builder.
pub fn shutdown_channel() -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
    oneshot::channel()
}
