//! Built-in resources: a plain-text greeting and a JSON server-info blob.

use crate::protocol::PROTOCOL_VERSION;

pub const GREETING_URI: &str = "resource://greeting";
pub const SERVER_INFO_URI: &str = "resource://server_info";

pub fn greeting() -> Result<String, String> {
    Ok("Hello! Welcome to the MCP session server!".to_string())
}

pub fn server_info() -> Result<String, String> {
    let payload = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "protocolVersion": PROTOCOL_VERSION,
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
    });
    serde_json::to_string(&payload).map_err(|e| format!("serialization failed: {e}"))
}
