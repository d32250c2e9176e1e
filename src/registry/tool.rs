//! Tool descriptors, handlers and results.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::Content;
use super::error::HandlerError;
use super::store::{Keyed, Registry};

/// Arguments passed to tool and resource handlers
pub type Arguments = serde_json::Map<String, Value>;

/// An MCP tool that can be called by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name (e.g., "linear_get_issue")
    pub name: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for input parameters
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a descriptor accepting an empty object
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    /// Set the input schema
    pub fn with_input_schema(mut self, input_schema: Value) -> Self {
        self.input_schema = input_schema;
        self
    }
}

impl Keyed for ToolDescriptor {
    const KIND: &'static str = "tool";
    const KEY_FIELD: &'static str = "name";

    fn key(&self) -> &str {
        &self.name
    }
}

/// Result of a tool call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<Content>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Successful result with a single text block
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
        }
    }

    /// Successful result with a pretty-printed JSON text block
    pub fn json<T: Serialize>(value: &T) -> Result<Self, HandlerError> {
        Ok(Self::text(serde_json::to_string_pretty(value)?))
    }

    /// Failed result with a single text block
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: true,
        }
    }

    /// Concatenated text of all content blocks
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Handler for executing a tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with the given arguments
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError>;
}

/// Adapter turning an async closure into a [`ToolHandler`]
pub struct FnTool<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnTool<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolResult, HandlerError>> + Send + 'static,
{
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        (self.0)(args).await
    }
}

/// Wrap an async closure as a tool handler
pub fn tool_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolResult, HandlerError>> + Send + 'static,
{
    Arc::new(FnTool(f))
}

/// Registry for all MCP tools
pub type ToolRegistry = Registry<ToolDescriptor, dyn ToolHandler>;
