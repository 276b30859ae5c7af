//! Session client: spawns a server process, performs the initialization
//! handshake, and issues typed calls over its stdio.
//!
//! One call is in flight at a time; `call` blocks until the matching
//! response arrives or the configured timeout elapses. Responses whose id
//! matches no pending call are discarded rather than raised, so a desynced
//! peer cannot wedge the session.

use std::collections::HashMap;
use std::process::Stdio;

use serde::Deserialize;
use serde_json::Value;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::protocol::{
    InitializeResult, JsonRpcRequest, Message, RpcId, ServerCapabilities, ServerInfo, ToolResult,
    PROTOCOL_VERSION,
};
use crate::transport::{LineTransport, TransportError};

/// Session-client failure.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to spawn server process: {0}")]
    Spawn(std::io::Error),
    #[error("not connected to a server")]
    NotConnected,
    #[error("no response within the configured timeout")]
    Timeout,
    #[error("server closed the connection")]
    TransportClosed,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("server error {code}: {message}")]
    Rpc { code: i32, message: String },
    #[error("tool reported an error: {0}")]
    Tool(String),
    #[error("malformed response payload: {0}")]
    Payload(String),
}

/// A tool entry from `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

/// A resource entry from `resources/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInfo {
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
}

/// A prompt entry from `prompts/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One client-to-server session, from `initialize` through disconnect.
///
/// Owns the spawned server process exclusively; no other component may
/// terminate it.
#[derive(Debug)]
pub struct McpClient {
    config: ClientConfig,
    child: Option<Child>,
    transport: Option<LineTransport<ChildStdout, ChildStdin>>,
    next_id: i64,
    pending: HashMap<i64, String>,
    server_info: Option<ServerInfo>,
    capabilities: ServerCapabilities,
}

impl McpClient {
    /// Spawn the configured server and complete the `initialize` handshake.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let (program, args) = config
            .server_command
            .split_first()
            .ok_or(ClientError::NotConnected)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(ClientError::Spawn)?;

        let stdin = child.stdin.take().ok_or(ClientError::NotConnected)?;
        let stdout = child.stdout.take().ok_or(ClientError::NotConnected)?;

        let mut client = Self {
            config,
            child: Some(child),
            transport: Some(LineTransport::new(stdout, stdin)),
            next_id: 0,
            pending: HashMap::new(),
            server_info: None,
            capabilities: ServerCapabilities::default(),
        };

        match client.initialize().await {
            Ok(()) => Ok(client),
            Err(e) => {
                // Never leak the child on a failed handshake.
                client.disconnect().await;
                Err(e)
            }
        }
    }

    async fn initialize(&mut self) -> Result<(), ClientError> {
        let params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }
        });

        let result = self.call("initialize", Some(params)).await?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| ClientError::Payload(format!("initialize result: {e}")))?;

        info!(
            server = %init.server_info.name,
            version = %init.server_info.version,
            "session initialized"
        );
        self.server_info = Some(init.server_info);
        self.capabilities = init.capabilities;
        Ok(())
    }

    /// Identity the server announced during the handshake.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Capability categories negotiated during the handshake.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Send one request and block until its response arrives.
    pub async fn call(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, ClientError> {
        let transport = self.transport.as_mut().ok_or(ClientError::NotConnected)?;

        self.next_id += 1;
        let id = self.next_id;
        self.pending.insert(id, method.to_string());

        let request = JsonRpcRequest::new(RpcId::Number(id), method, params);
        let line = serde_json::to_string(&request)?;
        transport.write_line(&line).await?;

        let outcome = tokio::time::timeout(
            self.config.request_timeout,
            Self::await_response(transport, &self.pending),
        )
        .await;
        self.pending.remove(&id);

        let response = match outcome {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                if matches!(e, ClientError::TransportClosed) {
                    // All outstanding calls on this session are dead.
                    self.pending.clear();
                }
                return Err(e);
            }
            Err(_) => {
                warn!(method, id, "call timed out");
                return Err(ClientError::Timeout);
            }
        };

        if let Some(error) = response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| ClientError::Payload("response carried no result".into()))
    }

    /// Reads lines until a response whose id matches a pending call
    /// arrives. Anything else on the wire is discarded.
    async fn await_response(
        transport: &mut LineTransport<ChildStdout, ChildStdin>,
        pending: &HashMap<i64, String>,
    ) -> Result<crate::protocol::JsonRpcResponse, ClientError> {
        loop {
            let line = match transport.read_line().await? {
                Some(line) => line,
                None => return Err(ClientError::TransportClosed),
            };
            if line.is_empty() {
                continue;
            }

            match Message::decode(&line) {
                Ok(Message::Response(resp))
                    if matches!(&resp.id, Some(RpcId::Number(n)) if pending.contains_key(n)) =>
                {
                    return Ok(resp);
                }
                Ok(Message::Response(resp)) => {
                    debug!(id = ?resp.id, "discarding response for unknown request");
                }
                Ok(other) => {
                    debug!(message = ?other, "discarding non-response message");
                }
                Err(e) => {
                    debug!(%e, "discarding undecodable line");
                }
            }
        }
    }

    /// `tools/list`: the server's tool catalog.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, ClientError> {
        let result = self.call("tools/list", Some(serde_json::json!({}))).await?;
        extract(result, "tools")
    }

    /// `tools/call`: invoke a tool and return its textual output.
    ///
    /// A handler-level failure (`isError` result) surfaces as
    /// [`ClientError::Tool`], distinct from protocol-level [`ClientError::Rpc`].
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<String, ClientError> {
        let params = serde_json::json!({ "name": name, "arguments": arguments });
        let result = self.call("tools/call", Some(params)).await?;

        let tool_result: ToolResult = serde_json::from_value(result)
            .map_err(|e| ClientError::Payload(format!("tool result: {e}")))?;
        let text = tool_result
            .content
            .first()
            .map(|c| c.text.clone())
            .unwrap_or_default();

        if tool_result.is_error {
            Err(ClientError::Tool(text))
        } else {
            Ok(text)
        }
    }

    /// `resources/list`: the server's resource catalog.
    pub async fn list_resources(&mut self) -> Result<Vec<ResourceInfo>, ClientError> {
        let result = self
            .call("resources/list", Some(serde_json::json!({})))
            .await?;
        extract(result, "resources")
    }

    /// `resources/read`: fetch a resource's textual payload.
    pub async fn read_resource(&mut self, uri: &str) -> Result<String, ClientError> {
        let result = self
            .call("resources/read", Some(serde_json::json!({ "uri": uri })))
            .await?;
        let text = result["contents"][0]["text"]
            .as_str()
            .ok_or_else(|| ClientError::Payload("resource contents missing text".into()))?;
        Ok(text.to_string())
    }

    /// `prompts/list`: the server's prompt catalog.
    pub async fn list_prompts(&mut self) -> Result<Vec<PromptInfo>, ClientError> {
        let result = self
            .call("prompts/list", Some(serde_json::json!({})))
            .await?;
        extract(result, "prompts")
    }

    /// `prompts/get`: fetch a templated prompt body.
    pub async fn get_prompt(
        &mut self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<String, ClientError> {
        let mut params = serde_json::json!({ "name": name });
        if let Some(args) = arguments {
            params["arguments"] = args;
        }
        let result = self.call("prompts/get", Some(params)).await?;
        let text = result["messages"][0]["content"]["text"]
            .as_str()
            .ok_or_else(|| ClientError::Payload("prompt messages missing text".into()))?;
        Ok(text.to_string())
    }

    /// Terminate the server process and release the transport.
    ///
    /// Idempotent: calling it on an already-disconnected client is a no-op.
    pub async fn disconnect(&mut self) {
        // Dropping the transport closes the child's stdin first, so a
        // well-behaved server exits on EOF before the kill lands.
        self.transport = None;
        self.pending.clear();
        self.server_info = None;
        self.capabilities = ServerCapabilities::default();

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                // Already exited is fine; anything else is worth a log line.
                if e.kind() != std::io::ErrorKind::InvalidInput {
                    warn!(%e, "failed to signal server process");
                }
            }
            match child.wait().await {
                Ok(status) => debug!(%status, "server process reaped"),
                Err(e) => warn!(%e, "failed to reap server process"),
            }
        }
    }
}

fn extract<T: serde::de::DeserializeOwned>(result: Value, key: &str) -> Result<Vec<T>, ClientError> {
    let entries = result
        .get(key)
        .cloned()
        .ok_or_else(|| ClientError::Payload(format!("result missing {key:?}")))?;
    serde_json::from_value(entries).map_err(|e| ClientError::Payload(format!("{key}: {e}")))
}
