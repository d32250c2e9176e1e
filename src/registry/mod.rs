//! Capability registry.
//!
//! Holds the tools, prompts and resources the server exposes. Capability
//! modules register into a [`CapabilityRegistry`] during startup; the
//! dispatcher only ever goes through the accessors defined here.

mod content;
mod error;
mod prompt;
mod reader;
mod resource;
mod store;
mod template;
mod tool;

use std::sync::Arc;

pub use content::{Content, ResourceBody, ResourceContent, ResourcePayload};
pub use error::{HandlerError, RegistrationError};
pub use prompt::{
    prompt_fn, FnPrompt, PromptArgument, PromptArguments, PromptDescriptor, PromptHandler,
    PromptMessage, PromptRegistry, Role,
};
pub use reader::{read_resource, ResourceReadError};
pub use resource::{
    resource_fn, FnResource, ResourceDescriptor, ResourceHandler, ResourceKey, ResourceRegistry,
    ResourceResult,
};
pub use store::{Keyed, Registry};
pub use template::{TemplateError, UriTemplate};
pub use tool::{tool_fn, Arguments, FnTool, ToolDescriptor, ToolHandler, ToolRegistry, ToolResult};

pub(crate) use error::panic_message;

/// The three capability registries, constructed once and shared by reference
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    tools: ToolRegistry,
    prompts: PromptRegistry,
    resources: ResourceRegistry,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_tool(
        &self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<ToolDescriptor, RegistrationError> {
        self.tools.register(descriptor, handler)
    }

    pub fn register_prompt(
        &self,
        descriptor: PromptDescriptor,
        handler: Arc<dyn PromptHandler>,
    ) -> Result<PromptDescriptor, RegistrationError> {
        self.prompts.register(descriptor, handler)
    }

    /// Register a literal resource or a resource template
    pub fn register_resource(
        &self,
        descriptor: ResourceDescriptor,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<ResourceDescriptor, RegistrationError> {
        self.resources.register(descriptor, handler)
    }

    pub fn get_all_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.descriptors()
    }

    pub fn get_all_prompts(&self) -> Vec<PromptDescriptor> {
        self.prompts.descriptors()
    }

    /// Literal-URI resources only
    pub fn get_all_resources(&self) -> Vec<ResourceDescriptor> {
        self.resources.filtered(|d| !d.is_template())
    }

    /// URI-template resources only
    pub fn get_resource_templates(&self) -> Vec<ResourceDescriptor> {
        self.resources.filtered(ResourceDescriptor::is_template)
    }

    pub fn get_tool_handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.handler(name)
    }

    pub fn get_prompt_handler(&self, name: &str) -> Option<Arc<dyn PromptHandler>> {
        self.prompts.handler(name)
    }

    /// Handler registered under the exact URI or template string
    pub fn get_resource_handler(&self, uri: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.resources.handler(uri)
    }

    pub fn get_tool(&self, name: &str) -> Option<ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn get_prompt_by_name(&self, name: &str) -> Option<PromptDescriptor> {
        self.prompts.get(name)
    }

    pub fn get_resource(&self, uri: &str) -> Option<ResourceDescriptor> {
        self.resources.get(uri)
    }

    /// Read a resource; see [`read_resource`]
    pub async fn read_resource(
        &self,
        uri: &str,
        args: Option<Arguments>,
    ) -> Result<ResourceContent, ResourceReadError> {
        read_resource(&self.resources, uri, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resource_partition() {
        let registry = CapabilityRegistry::new();
        let handler =
            resource_fn(|_| async { Ok(ResourceResult::ok(ResourcePayload::text("ok"))) });

        registry
            .register_resource(ResourceDescriptor::uri("linear://teams", "Teams"), handler.clone())
            .unwrap();
        registry
            .register_resource(
                ResourceDescriptor::template("linear://teams/{teamId}", "Team"),
                handler,
            )
            .unwrap();

        let literals = registry.get_all_resources();
        let templates = registry.get_resource_templates();
        assert_eq!(literals.len(), 1);
        assert_eq!(literals[0].literal_uri(), Some("linear://teams"));
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].uri_template(), Some("linear://teams/{teamId}"));
    }

    #[test]
    fn test_kinds_are_isolated() {
        let registry = CapabilityRegistry::new();
        registry
            .register_tool(
                ToolDescriptor::new("shared", "tool"),
                tool_fn(|_| async { Ok(ToolResult::text("tool")) }),
            )
            .unwrap();

        assert!(registry.get_tool_handler("shared").is_some());
        assert!(registry.get_prompt_handler("shared").is_none());

        registry
            .register_prompt(
                PromptDescriptor::new("shared", "prompt"),
                prompt_fn(|_| Ok(vec![PromptMessage::user("prompt")])),
            )
            .unwrap();

        assert_eq!(registry.get_all_tools().len(), 1);
        assert_eq!(registry.get_all_prompts().len(), 1);
        assert_eq!(
            registry.get_tool("shared").and_then(|t| t.description),
            Some("tool".to_string())
        );
        assert_eq!(
            registry.get_prompt_by_name("shared").and_then(|p| p.description),
            Some("prompt".to_string())
        );
    }
}
