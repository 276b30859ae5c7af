//! MCP server and session client over newline-delimited JSON-RPC 2.0 stdio.
//!
//! The server side exposes a registry of tools, resources, and prompts via
//! `initialize`, `tools/*`, `resources/*`, and `prompts/*`; the client side
//! spawns a server process, performs the handshake, and issues typed calls
//! with request/response correlation and a per-call timeout.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;
