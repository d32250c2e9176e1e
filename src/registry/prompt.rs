//! Prompt descriptors and handlers.
//!
//! Prompt handlers are synchronous: rendering a prompt only formats text from
//! its arguments and never waits on the tracker.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::content::Content;
use super::error::HandlerError;
use super::store::{Keyed, Registry};

/// Arguments passed to prompt handlers
pub type PromptArguments = HashMap<String, String>;

/// A declared prompt argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,
}

impl PromptArgument {
    /// A required argument
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            required: true,
        }
    }

    /// An optional argument
    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            required: false,
        }
    }
}

/// An MCP prompt template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

impl PromptDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            arguments: Vec::new(),
        }
    }

    /// Add a declared argument
    pub fn argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }
}

impl Keyed for PromptDescriptor {
    const KIND: &'static str = "prompt";
    const KEY_FIELD: &'static str = "name";

    fn key(&self) -> &str {
        &self.name
    }
}

/// Speaker of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A role-tagged prompt message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: Content,
}

impl PromptMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::text(text),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Content::text(text),
        }
    }
}

/// Handler for rendering a prompt
pub trait PromptHandler: Send + Sync {
    /// Render the prompt messages for the given arguments
    fn render(&self, args: &PromptArguments) -> Result<Vec<PromptMessage>, HandlerError>;
}

/// Adapter turning a closure into a [`PromptHandler`]
pub struct FnPrompt<F>(F);

impl<F> PromptHandler for FnPrompt<F>
where
    F: Fn(&PromptArguments) -> Result<Vec<PromptMessage>, HandlerError> + Send + Sync,
{
    fn render(&self, args: &PromptArguments) -> Result<Vec<PromptMessage>, HandlerError> {
        (self.0)(args)
    }
}

/// Wrap a closure as a prompt handler
pub fn prompt_fn<F>(f: F) -> Arc<dyn PromptHandler>
where
    F: Fn(&PromptArguments) -> Result<Vec<PromptMessage>, HandlerError> + Send + Sync + 'static,
{
    Arc::new(FnPrompt(f))
}

/// Registry for all MCP prompts
pub type PromptRegistry = Registry<PromptDescriptor, dyn PromptHandler>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_serialization() {
        let value = serde_json::to_value(PromptMessage::user("hello")).unwrap();
        assert_eq!(
            value,
            json!({"role": "user", "content": {"type": "text", "text": "hello"}})
        );
    }

    #[test]
    fn test_prompt_fn_renders() {
        let handler = prompt_fn(|args: &PromptArguments| {
            let who = args.get("who").cloned().unwrap_or_else(|| "world".into());
            Ok(vec![PromptMessage::user(format!("hello {who}"))])
        });

        let mut args = PromptArguments::new();
        args.insert("who".into(), "team".into());
        let messages = handler.render(&args).unwrap();

        assert_eq!(messages, vec![PromptMessage::user("hello team")]);
    }

    #[test]
    fn test_descriptor_arguments() {
        let descriptor = PromptDescriptor::new("triage", "Triage an issue")
            .argument(PromptArgument::required("issueId", "Issue to triage"))
            .argument(PromptArgument::optional("focus", "Area to focus on"));

        assert_eq!(descriptor.arguments.len(), 2);
        assert!(descriptor.arguments[0].required);
        assert!(!descriptor.arguments[1].required);
    }
}
