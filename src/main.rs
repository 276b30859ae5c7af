use mcp_session::server;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr; stdout is the wire.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let mut server = server::default_server();
    if let Err(e) = server.run().await {
        eprintln!("mcp-session-server: fatal error: {e}");
        std::process::exit(1);
    }
}
