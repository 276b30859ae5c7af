//! Built-in capability catalog: the tools, resources, and prompts the
//! server binary exposes out of the box.

pub mod calculate;
pub mod echo;
pub mod prompts;
pub mod resources;
pub mod time;

use crate::registry::{
    CapabilityRegistry, PromptArgument, PromptDescriptor, ResourceDescriptor, ToolDescriptor,
};

/// Builds the default registry. An embedding binary can start from this and
/// register more capabilities, or replace built-ins by name.
pub fn default_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();

    registry.register_tool(ToolDescriptor {
        name: "echo".into(),
        description: "Echo back the input message".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Message to echo back"
                }
            },
            "required": ["message"]
        }),
        handler: Box::new(echo::handle),
    });

    registry.register_tool(ToolDescriptor {
        name: "calculate".into(),
        description: "Perform basic mathematical calculations".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression to evaluate (e.g., '2 + 2', '10 * 5')"
                }
            },
            "required": ["expression"]
        }),
        handler: Box::new(|arguments| {
            let expression = arguments
                .get("expression")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| "expression must be a string".to_string())?;
            calculate::evaluate(expression)
        }),
    });

    registry.register_tool(ToolDescriptor {
        name: "get_time".into(),
        description: "Get current date and time".into(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }),
        handler: Box::new(|_| time::handle()),
    });

    registry.register_resource(ResourceDescriptor {
        uri: resources::GREETING_URI.into(),
        name: "Greeting Message".into(),
        description: "A simple greeting message".into(),
        mime_type: "text/plain".into(),
        handler: Box::new(resources::greeting),
    });

    registry.register_resource(ResourceDescriptor {
        uri: resources::SERVER_INFO_URI.into(),
        name: "Server Information".into(),
        description: "Basic information about the running server".into(),
        mime_type: "application/json".into(),
        handler: Box::new(resources::server_info),
    });

    registry.register_prompt(PromptDescriptor {
        name: "helpful_assistant".into(),
        description: "A helpful assistant prompt".into(),
        arguments: vec![PromptArgument {
            name: "topic".into(),
            description: "The topic to be helpful about".into(),
            required: false,
        }],
        handler: Box::new(prompts::helpful_assistant),
    });

    registry
}
