//! Server-loop tests over an in-memory duplex channel: framing, the
//! initialization gate, and parse-error recovery, without spawning a
//! process.

use mcp_session::handlers;
use mcp_session::server::McpServer;
use mcp_session::transport::{LineTransport, MAX_MESSAGE_BYTES};
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};

type TestChannel = LineTransport<ReadHalf<tokio::io::DuplexStream>, WriteHalf<tokio::io::DuplexStream>>;

fn start_server() -> (TestChannel, tokio::task::JoinHandle<()>) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);

    let (server_read, server_write) = tokio::io::split(server_io);
    let handle = tokio::spawn(async move {
        let mut server = McpServer::new(handlers::default_registry());
        server
            .serve(LineTransport::new(server_read, server_write))
            .await
            .expect("server loop");
    });

    let (client_read, client_write) = tokio::io::split(client_io);
    (LineTransport::new(client_read, client_write), handle)
}

async fn exchange(channel: &mut TestChannel, line: &str) -> serde_json::Value {
    channel.write_line(line).await.expect("write");
    let response = channel
        .read_line()
        .await
        .expect("read")
        .expect("server must respond");
    serde_json::from_str(&response).expect("response is JSON")
}

#[tokio::test]
async fn handshake_then_tool_call_over_the_wire() {
    let (mut channel, handle) = start_server();

    let init = exchange(
        &mut channel,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
    )
    .await;
    assert_eq!(init["id"], 1);
    assert!(init["result"]["capabilities"]["tools"].is_object());

    let call = exchange(
        &mut channel,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"echo","arguments":{"message":"hi"}}}"#,
    )
    .await;
    assert_eq!(call["result"]["content"][0]["text"], "hi");

    // Closing our end is EOF for the server; the loop exits cleanly.
    drop(channel);
    handle.await.expect("server task");
}

#[tokio::test]
async fn pre_initialize_request_is_rejected_on_the_wire() {
    let (mut channel, handle) = start_server();

    let resp = exchange(
        &mut channel,
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
    )
    .await;
    assert_eq!(resp["error"]["code"], -32600);

    drop(channel);
    handle.await.expect("server task");
}

#[tokio::test]
async fn parse_error_recovers_the_request_id() {
    let (mut channel, handle) = start_server();

    // Valid JSON, wrong version: undecodable as a message, but the id is
    // recoverable so the reply can be correlated.
    let resp = exchange(
        &mut channel,
        r#"{"jsonrpc":"1.0","id":7,"method":"initialize"}"#,
    )
    .await;
    assert_eq!(resp["id"], 7);
    assert_eq!(resp["error"]["code"], -32700);

    // Unparseable garbage gets a null id.
    let resp = exchange(&mut channel, "{garbage").await;
    assert!(resp["id"].is_null());
    assert_eq!(resp["error"]["code"], -32700);

    drop(channel);
    handle.await.expect("server task");
}

#[tokio::test]
async fn invalid_utf8_line_does_not_kill_the_server() {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);

    let (server_read, server_write) = tokio::io::split(server_io);
    let handle = tokio::spawn(async move {
        let mut server = McpServer::new(handlers::default_registry());
        server
            .serve(LineTransport::new(server_read, server_write))
            .await
            .expect("server loop");
    });

    // Raw bytes, not a &str line: deliberately broken UTF-8.
    let (client_read, mut client_write) = tokio::io::split(client_io);
    client_write.write_all(b"\xff\xfe\xfd\n").await.expect("write raw");
    client_write.flush().await.expect("flush");

    let mut channel = LineTransport::new(client_read, client_write);
    let reply = channel
        .read_line()
        .await
        .expect("read")
        .expect("server must answer the bad line");
    let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply["error"]["code"], -32700);

    // The loop survived; a normal handshake still works.
    let init = exchange(
        &mut channel,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
    )
    .await;
    assert_eq!(init["id"], 1);
    assert!(init["result"].is_object());

    drop(channel);
    handle.await.expect("server task");
}

#[tokio::test]
async fn oversized_line_gets_parse_error_and_service_continues() {
    let (mut channel, handle) = start_server();

    let oversized = "1".repeat(MAX_MESSAGE_BYTES + 1);
    let reply = exchange(&mut channel, &oversized).await;
    assert_eq!(reply["error"]["code"], -32700);

    let init = exchange(
        &mut channel,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
    )
    .await;
    assert_eq!(init["id"], 1);
    assert!(init["result"].is_object());

    drop(channel);
    handle.await.expect("server task");
}

#[tokio::test]
async fn blank_lines_are_skipped() {
    let (mut channel, handle) = start_server();

    channel.write_line("").await.expect("write blank");
    let init = exchange(
        &mut channel,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
    )
    .await;
    assert_eq!(init["id"], 1, "blank line must not consume a response");

    drop(channel);
    handle.await.expect("server task");
}
