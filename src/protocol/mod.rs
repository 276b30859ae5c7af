pub mod message;
pub mod request;
pub mod response;

pub use message::{recover_id, DecodeError, Message};
pub use request::{
    ClientInfo, InitializeParams, JsonRpcRequest, PromptGetParams, ResourceReadParams, RpcId,
    ToolCallParams,
};
pub use response::{
    InitializeResult, JsonRpcError, JsonRpcResponse, ServerCapabilities, ServerInfo, ToolResult,
    ToolResultContent,
};

/// MCP protocol revision spoken by both sides.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
