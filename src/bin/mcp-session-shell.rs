//! Thin interactive shell over the session client: translates typed
//! commands into client calls and prints the results.

use std::io::{BufRead, Write};

use mcp_session::client::{ClientError, McpClient};
use mcp_session::config::ClientConfig;

const HELP: &str = "\
Commands:
  tools              List available tools
  echo <message>     Run the echo tool
  calc <expression>  Run the calculator tool
  time               Get the current time
  resources          List available resources
  read <uri>         Read a resource
  prompts            List available prompts
  prompt <name> [topic]  Fetch a prompt
  quit               Exit";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = match ClientConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-session-shell: configuration error: {e}");
            std::process::exit(1);
        }
    };

    println!("Connecting to MCP server...");
    let mut client = match McpClient::connect(config).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("mcp-session-shell: failed to connect: {e}");
            std::process::exit(1);
        }
    };

    if let Some(info) = client.server_info() {
        println!("Connected to {} {}. Type 'help' for commands.", info.name, info.version);
    }

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("input error: {e}");
                break;
            }
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let (command, rest) = match input.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (input, ""),
        };

        let outcome = run_command(&mut client, command, rest).await;
        match outcome {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => println!("Error: {e}"),
        }
    }

    client.disconnect().await;
    println!("Disconnected from server");
}

/// Returns `Ok(true)` when the shell should exit.
async fn run_command(
    client: &mut McpClient,
    command: &str,
    rest: &str,
) -> Result<bool, ClientError> {
    match command {
        "quit" | "exit" => return Ok(true),
        "help" => println!("{HELP}"),
        "tools" => {
            for tool in client.list_tools().await? {
                println!("  {}: {}", tool.name, tool.description);
            }
        }
        "echo" => {
            let result = client
                .call_tool("echo", serde_json::json!({ "message": rest }))
                .await?;
            println!("Result: {result}");
        }
        "calc" => {
            let result = client
                .call_tool("calculate", serde_json::json!({ "expression": rest }))
                .await?;
            println!("Result: {result}");
        }
        "time" => {
            let result = client.call_tool("get_time", serde_json::json!({})).await?;
            println!("Current time: {result}");
        }
        "resources" => {
            for resource in client.list_resources().await? {
                println!("  {}: {}", resource.uri, resource.description);
            }
        }
        "read" => {
            let text = client.read_resource(rest).await?;
            println!("{text}");
        }
        "prompts" => {
            for prompt in client.list_prompts().await? {
                println!("  {}: {}", prompt.name, prompt.description);
            }
        }
        "prompt" => {
            let (name, topic) = match rest.split_once(' ') {
                Some((n, t)) => (n, Some(t.trim())),
                None => (rest, None),
            };
            let arguments = topic.map(|t| serde_json::json!({ "topic": t }));
            let text = client.get_prompt(name, arguments).await?;
            println!("{text}");
        }
        _ => println!("Unknown command. Type 'help' for available commands."),
    }
    Ok(false)
}
