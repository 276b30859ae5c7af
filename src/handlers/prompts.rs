use serde_json::{Map, Value};

/// The `helpful_assistant` prompt: a system-message template with an
/// optional `topic` argument.
pub fn helpful_assistant(arguments: &Map<String, Value>) -> Result<String, String> {
    let topic = arguments
        .get("topic")
        .and_then(Value::as_str)
        .unwrap_or("general assistance");
    Ok(format!(
        "You are a helpful assistant specialized in {topic}. \
         Please provide clear, accurate, and helpful responses."
    ))
}
