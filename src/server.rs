//! Stdio server loop: one JSON-RPC message per line, strictly one request
//! at a time in arrival order.

use tokio::io::{Stdin, Stdout};
use tracing::{debug, error, info};

use crate::dispatch::Dispatcher;
use crate::protocol::{self, JsonRpcError, JsonRpcResponse, Message, ServerInfo};
use crate::registry::CapabilityRegistry;
use crate::transport::{LineTransport, TransportError};

/// Server loop failure. Per-message problems (bad JSON, unknown methods)
/// are answered on the wire and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// MCP server over newline-delimited JSON-RPC 2.0 stdio.
pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(registry: CapabilityRegistry) -> Self {
        let server_info = ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        Self {
            dispatcher: Dispatcher::new(registry, server_info),
        }
    }

    /// Serve requests from stdin and write responses to stdout until EOF.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        let transport = LineTransport::new(tokio::io::stdin(), tokio::io::stdout());
        self.serve(transport).await
    }

    /// The loop itself, generic over the channel for tests.
    pub async fn serve<R, W>(
        &mut self,
        mut transport: LineTransport<R, W>,
    ) -> Result<(), ServerError>
    where
        R: tokio::io::AsyncRead + Unpin,
        W: tokio::io::AsyncWrite + Unpin,
    {
        loop {
            let line = match transport.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("input closed, shutting down");
                    break;
                }
                Err(TransportError::Oversized(n)) => {
                    error!(bytes = n, "dropping oversized message");
                    let resp = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    write_response(&mut transport, &resp).await?;
                    continue;
                }
                Err(TransportError::Encoding) => {
                    // The bad line is already consumed; answer and keep
                    // serving.
                    error!("dropping non-UTF-8 message");
                    let resp = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    write_response(&mut transport, &resp).await?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if line.is_empty() {
                continue;
            }

            let message = match Message::decode(&line) {
                Ok(m) => m,
                Err(e) => {
                    // Recover the request id when the line was valid JSON so
                    // the peer can still correlate the failure.
                    error!(%e, "failed to decode message");
                    let id = protocol::recover_id(&line);
                    let resp = JsonRpcResponse::error(id, JsonRpcError::parse_error());
                    write_response(&mut transport, &resp).await?;
                    continue;
                }
            };

            match message {
                Message::Request(req) | Message::Notification(req) => {
                    if let Some(resp) = self.dispatcher.handle(&req) {
                        write_response(&mut transport, &resp).await?;
                    }
                }
                Message::Response(resp) => {
                    // Servers never issue requests, so no response is owed
                    // to us. Log and move on.
                    debug!(id = ?resp.id, "ignoring unsolicited response");
                }
            }
        }

        Ok(())
    }
}

async fn write_response<R, W>(
    transport: &mut LineTransport<R, W>,
    resp: &JsonRpcResponse,
) -> Result<(), ServerError>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let out = serde_json::to_string(resp)?;
    transport.write_line(&out).await?;
    Ok(())
}

/// Convenience constructor for the stock server binary.
pub fn default_server() -> McpServer {
    McpServer::new(crate::handlers::default_registry())
}

// Keep the concrete stdio types nameable for embedders that want to drive
// `serve` themselves.
pub type StdioTransport = LineTransport<Stdin, Stdout>;
