//! Request dispatcher: routes each incoming request by method name to the
//! capability registry and builds the response.
//!
//! The routing table is the single `match` in [`Dispatcher::handle`]; new
//! methods get a new arm there, never branching elsewhere. Handler failures
//! are domain errors carried inside a successful response (`isError`);
//! handler panics are caught and become protocol-level internal errors. The
//! dispatcher never crashes the process.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, PromptGetParams,
    ResourceReadParams, ServerCapabilities, ServerInfo, ToolCallParams, ToolResult,
    PROTOCOL_VERSION,
};
use crate::registry::{CapabilityRegistry, ToolDescriptor};

/// Routes requests for one session. Owns the registry and the
/// initialization gate.
pub struct Dispatcher {
    registry: CapabilityRegistry,
    server_info: ServerInfo,
    initialized: bool,
}

impl Dispatcher {
    pub fn new(registry: CapabilityRegistry, server_info: ServerInfo) -> Self {
        Self {
            registry,
            server_info,
            initialized: false,
        }
    }

    /// Dispatch one request. Returns `None` for notifications (no response
    /// is owed).
    pub fn handle(&mut self, req: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Notifications never get a response, whatever the method.
        if req.id.is_none() {
            if req.method != "notifications/initialized" {
                debug!(method = %req.method, "ignoring notification");
            }
            return None;
        }

        // Only `initialize` is allowed before the handshake completes.
        if !self.initialized && req.method != "initialize" {
            return Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request_with("Server not initialized"),
            ));
        }

        match req.method.as_str() {
            "initialize" => {
                let params: Option<InitializeParams> = req
                    .params
                    .clone()
                    .and_then(|v| serde_json::from_value(v).ok());
                if let Some(client) = params.and_then(|p| p.client_info) {
                    debug!(
                        name = client.name.as_deref().unwrap_or("unknown"),
                        version = client.version.as_deref().unwrap_or("unknown"),
                        "client connected"
                    );
                }
                self.initialized = true;
                let result = serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": self.capabilities(),
                    "serverInfo": self.server_info,
                });
                Some(JsonRpcResponse::success(req.id.clone(), result))
            }

            "ping" => Some(JsonRpcResponse::success(req.id.clone(), serde_json::json!({}))),

            "tools/list" => {
                let tools: Vec<Value> = self
                    .registry
                    .list_tools()
                    .map(|t| {
                        serde_json::json!({
                            "name": t.name,
                            "description": t.description,
                            "inputSchema": t.input_schema,
                        })
                    })
                    .collect();
                Some(JsonRpcResponse::success(
                    req.id.clone(),
                    serde_json::json!({ "tools": tools }),
                ))
            }

            "tools/call" => {
                let params: ToolCallParams = match decode_params(req) {
                    Ok(p) => p,
                    Err(e) => return Some(JsonRpcResponse::error(req.id.clone(), e)),
                };
                Some(self.call_tool(req, &params))
            }

            "resources/list" => {
                let resources: Vec<Value> = self
                    .registry
                    .list_resources()
                    .map(|r| {
                        serde_json::json!({
                            "uri": r.uri,
                            "name": r.name,
                            "description": r.description,
                            "mimeType": r.mime_type,
                        })
                    })
                    .collect();
                Some(JsonRpcResponse::success(
                    req.id.clone(),
                    serde_json::json!({ "resources": resources }),
                ))
            }

            "resources/read" => {
                let params: ResourceReadParams = match decode_params(req) {
                    Ok(p) => p,
                    Err(e) => return Some(JsonRpcResponse::error(req.id.clone(), e)),
                };
                Some(self.read_resource(req, &params))
            }

            "prompts/list" => {
                let prompts: Vec<Value> = self
                    .registry
                    .list_prompts()
                    .map(|p| {
                        serde_json::json!({
                            "name": p.name,
                            "description": p.description,
                            "arguments": p.arguments,
                        })
                    })
                    .collect();
                Some(JsonRpcResponse::success(
                    req.id.clone(),
                    serde_json::json!({ "prompts": prompts }),
                ))
            }

            "prompts/get" => {
                let params: PromptGetParams = match decode_params(req) {
                    Ok(p) => p,
                    Err(e) => return Some(JsonRpcResponse::error(req.id.clone(), e)),
                };
                Some(self.get_prompt(req, &params))
            }

            _ => Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::method_not_found(&req.method),
            )),
        }
    }

    /// Capability categories, each advertised iff the registry holds at
    /// least one entry of that kind.
    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: self.registry.has_tools().then(Map::new),
            resources: self.registry.has_resources().then(Map::new),
            prompts: self.registry.has_prompts().then(Map::new),
        }
    }

    fn call_tool(&self, req: &JsonRpcRequest, params: &ToolCallParams) -> JsonRpcResponse {
        let Some(tool) = self.registry.get_tool(&params.name) else {
            // Unknown tool is a domain error, not a protocol error: the
            // caller addressed the right method with a bad tool name.
            return tool_response(req, ToolResult::error(format!("Unknown tool: {}", params.name)));
        };

        let arguments = match &params.arguments {
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return tool_response(
                    req,
                    ToolResult::error(format!("Arguments for {} must be an object", params.name)),
                );
            }
        };

        if let Err(result) = validate_arguments(tool, &arguments) {
            return tool_response(req, result);
        }

        match catch_unwind(AssertUnwindSafe(|| (tool.handler)(&arguments))) {
            Ok(Ok(text)) => tool_response(req, ToolResult::text(text)),
            Ok(Err(message)) => {
                debug!(tool = %params.name, %message, "tool handler reported an error");
                tool_response(req, ToolResult::error(message))
            }
            Err(panic) => {
                let detail = panic_message(&panic);
                warn!(tool = %params.name, detail, "tool handler panicked");
                JsonRpcResponse::error(
                    req.id.clone(),
                    JsonRpcError::internal_error(format!(
                        "Tool {} failed: {detail}",
                        params.name
                    )),
                )
            }
        }
    }

    fn read_resource(&self, req: &JsonRpcRequest, params: &ResourceReadParams) -> JsonRpcResponse {
        let Some(resource) = self.registry.get_resource(&params.uri) else {
            return JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_params(format!("Unknown resource: {}", params.uri)),
            );
        };

        match catch_unwind(AssertUnwindSafe(|| (resource.handler)())) {
            Ok(Ok(text)) => JsonRpcResponse::success(
                req.id.clone(),
                serde_json::json!({
                    "contents": [{
                        "uri": resource.uri,
                        "mimeType": resource.mime_type,
                        "text": text,
                    }]
                }),
            ),
            Ok(Err(message)) => JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::internal_error(message),
            ),
            Err(panic) => JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::internal_error(format!(
                    "Resource {} failed: {}",
                    params.uri,
                    panic_message(&panic)
                )),
            ),
        }
    }

    fn get_prompt(&self, req: &JsonRpcRequest, params: &PromptGetParams) -> JsonRpcResponse {
        let Some(prompt) = self.registry.get_prompt(&params.name) else {
            return JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_params(format!("Unknown prompt: {}", params.name)),
            );
        };

        let arguments = match &params.arguments {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };

        match catch_unwind(AssertUnwindSafe(|| (prompt.handler)(&arguments))) {
            Ok(Ok(text)) => JsonRpcResponse::success(
                req.id.clone(),
                serde_json::json!({
                    "description": prompt.description,
                    "messages": [{
                        "role": "system",
                        "content": { "type": "text", "text": text }
                    }]
                }),
            ),
            Ok(Err(message)) => JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::internal_error(message),
            ),
            Err(panic) => JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::internal_error(format!(
                    "Prompt {} failed: {}",
                    params.name,
                    panic_message(&panic)
                )),
            ),
        }
    }
}

/// Check call arguments against the tool's declared schema.
///
/// Required fields are checked explicitly first so the error message names
/// the missing parameter; the full JSON Schema pass then rejects arguments
/// that are present but of the wrong type (reject, never coerce).
fn validate_arguments(tool: &ToolDescriptor, arguments: &Map<String, Value>) -> Result<(), ToolResult> {
    if let Some(required) = tool.input_schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            if !arguments.contains_key(name) {
                return Err(ToolResult::error(format!(
                    "Missing required parameter: {name}"
                )));
            }
        }
    }

    let validator = jsonschema::validator_for(&tool.input_schema).map_err(|e| {
        ToolResult::error(format!("Tool {} has an invalid schema: {e}", tool.name))
    })?;

    let instance = Value::Object(arguments.clone());
    if let Err(error) = validator.validate(&instance) {
        return Err(ToolResult::error(format!(
            "Invalid arguments for {}: {error}",
            tool.name
        )));
    }

    Ok(())
}

fn tool_response(req: &JsonRpcRequest, result: ToolResult) -> JsonRpcResponse {
    let value = serde_json::to_value(&result).expect("ToolResult must serialize to JSON Value");
    JsonRpcResponse::success(req.id.clone(), value)
}

fn decode_params<T: serde::de::DeserializeOwned>(
    req: &JsonRpcRequest,
) -> Result<T, JsonRpcError> {
    match &req.params {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid {} params: {e}", req.method))),
        None => Err(JsonRpcError::invalid_params(format!(
            "Missing params for {}",
            req.method
        ))),
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
