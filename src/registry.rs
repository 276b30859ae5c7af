//! Capability registry: the server's catalog of tools, resources, and
//! prompts.
//!
//! Catalogs preserve registration order so client-visible enumeration is
//! deterministic across identical server builds. Registering a name that is
//! already present replaces the prior descriptor (last write wins); this is
//! deliberate, so an embedding binary can override a built-in.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// A tool handler: arguments in, textual output or a domain error out.
///
/// An `Err` is a handler-level failure (bad expression, division by zero)
/// and becomes an `isError` tool result, not a protocol error.
pub type ToolHandler = Box<dyn Fn(&Map<String, Value>) -> Result<String, String> + Send + Sync>;

/// A resource handler: produces the textual payload for a read.
pub type ResourceHandler = Box<dyn Fn() -> Result<String, String> + Send + Sync>;

/// A prompt handler: arguments in, templated prompt body out.
pub type PromptHandler = Box<dyn Fn(&Map<String, Value>) -> Result<String, String> + Send + Sync>;

/// A named, schema-described executable capability.
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema (object/properties/required) advertised in `tools/list`
    /// and enforced against call arguments.
    pub input_schema: Value,
    pub handler: ToolHandler,
}

/// A named, read-only textual data source.
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub handler: ResourceHandler,
}

/// One declared argument of a prompt template.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// A named, optionally parameterized template for assistant instructions.
pub struct PromptDescriptor {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    pub handler: PromptHandler,
}

/// Holds the server's capability catalog. Built once at startup and handed
/// to the dispatcher; there is no ambient global.
#[derive(Default)]
pub struct CapabilityRegistry {
    tools: IndexMap<String, ToolDescriptor>,
    resources: IndexMap<String, ResourceDescriptor>,
    prompts: IndexMap<String, PromptDescriptor>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tool(&mut self, descriptor: ToolDescriptor) {
        self.tools.insert(descriptor.name.clone(), descriptor);
    }

    pub fn register_resource(&mut self, descriptor: ResourceDescriptor) {
        self.resources.insert(descriptor.uri.clone(), descriptor);
    }

    pub fn register_prompt(&mut self, descriptor: PromptDescriptor) {
        self.prompts.insert(descriptor.name.clone(), descriptor);
    }

    /// Tools in registration order.
    pub fn list_tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Resources in registration order.
    pub fn list_resources(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.values()
    }

    /// Prompts in registration order.
    pub fn list_prompts(&self) -> impl Iterator<Item = &PromptDescriptor> {
        self.prompts.values()
    }

    pub fn get_tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn get_resource(&self, uri: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(uri)
    }

    pub fn get_prompt(&self, name: &str) -> Option<&PromptDescriptor> {
        self.prompts.get(name)
    }

    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    pub fn has_resources(&self) -> bool {
        !self.resources.is_empty()
    }

    pub fn has_prompts(&self) -> bool {
        !self.prompts.is_empty()
    }
}
