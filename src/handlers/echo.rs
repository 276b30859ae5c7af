use serde_json::{Map, Value};

/// The `echo` tool: identity transform of its `message` argument.
pub fn handle(arguments: &Map<String, Value>) -> Result<String, String> {
    let message = arguments
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| "message must be a string".to_string())?;
    Ok(message.to_string())
}
