//! Protocol dispatch over the capability registry.
//!
//! The [`Dispatcher`] turns MCP requests into registry lookups and handler
//! invocations, and always produces a well-formed response: unknown names,
//! handler errors and panics all become `isError` payloads.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{
    panic_message, Arguments, CapabilityRegistry, PromptArguments, PromptDescriptor,
    PromptMessage, ResourceContent, ResourceDescriptor, ToolDescriptor, ToolResult,
};

/// Protocol-level dispatch failures
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },

    #[error("Failed to encode response: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Response to `tools/list`
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolDescriptor>,
}

/// Response to `prompts/list`
#[derive(Debug, Clone, Serialize)]
pub struct ListPromptsResponse {
    pub prompts: Vec<PromptDescriptor>,
}

/// Response to `resources/list`
#[derive(Debug, Clone, Serialize)]
pub struct ListResourcesResponse {
    pub resources: Vec<ResourceDescriptor>,
}

/// Response to `resources/templates/list`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourceTemplatesResponse {
    pub resource_templates: Vec<ResourceDescriptor>,
}

/// Response to `resources/read`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResourceResponse {
    pub contents: Vec<ResourceContent>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Set when no resource matched the URI
    #[serde(skip)]
    pub not_found: bool,
}

/// Response to `prompts/get`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPromptResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub messages: Vec<PromptMessage>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GetPromptResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

#[derive(Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Arguments>,
}

#[derive(Deserialize)]
struct ReadResourceParams {
    uri: String,
    #[serde(default)]
    arguments: Option<Arguments>,
}

#[derive(Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<PromptArguments>,
}

/// Routes protocol requests to registered capabilities
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher reads from
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn list_tools(&self) -> ListToolsResponse {
        ListToolsResponse {
            tools: self.registry.get_all_tools(),
        }
    }

    pub fn list_prompts(&self) -> ListPromptsResponse {
        ListPromptsResponse {
            prompts: self.registry.get_all_prompts(),
        }
    }

    pub fn list_resources(&self) -> ListResourcesResponse {
        ListResourcesResponse {
            resources: self.registry.get_all_resources(),
        }
    }

    pub fn list_resource_templates(&self) -> ListResourceTemplatesResponse {
        ListResourceTemplatesResponse {
            resource_templates: self.registry.get_resource_templates(),
        }
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Option<Arguments>) -> ToolResult {
        let Some(handler) = self.registry.get_tool_handler(name) else {
            tracing::debug!(tool = %name, "Unknown tool requested");
            return ToolResult::error(format!("Unknown tool: {}", name));
        };

        tracing::debug!(tool = %name, "Calling tool");
        let outcome = AssertUnwindSafe(handler.call(args.unwrap_or_default()))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!(tool = %name, error = %e, "Tool handler failed");
                ToolResult::error(
                    e.reported_message()
                        .unwrap_or_else(|| format!("Unknown error calling tool: {}", name)),
                )
            }
            Err(payload) => {
                tracing::error!(tool = %name, "Tool handler panicked");
                ToolResult::error(
                    panic_message(&*payload)
                        .unwrap_or_else(|| format!("Unknown error calling tool: {}", name)),
                )
            }
        }
    }

    /// Read a resource by URI
    pub async fn read_resource(&self, uri: &str, args: Option<Arguments>) -> ReadResourceResponse {
        match self.registry.read_resource(uri, args).await {
            Ok(content) => ReadResourceResponse {
                contents: vec![content],
                ..Default::default()
            },
            Err(e) => ReadResourceResponse {
                contents: Vec::new(),
                is_error: true,
                error_message: Some(e.to_string()),
                not_found: e.is_not_found(),
            },
        }
    }

    /// Render a prompt by name
    pub fn get_prompt(&self, name: &str, args: Option<PromptArguments>) -> GetPromptResponse {
        let (Some(descriptor), Some(handler)) = (
            self.registry.get_prompt_by_name(name),
            self.registry.get_prompt_handler(name),
        ) else {
            tracing::debug!(prompt = %name, "Unknown prompt requested");
            return GetPromptResponse::error(format!("Unknown prompt: {}", name));
        };

        let args = args.unwrap_or_default();
        if let Some(missing) = descriptor
            .arguments
            .iter()
            .find(|a| a.required && !args.contains_key(&a.name))
        {
            return GetPromptResponse::error(format!(
                "Missing required argument: {}",
                missing.name
            ));
        }

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| handler.render(&args)));

        match outcome {
            Ok(Ok(messages)) => GetPromptResponse {
                description: descriptor.description,
                messages,
                ..Default::default()
            },
            Ok(Err(e)) => {
                tracing::warn!(prompt = %name, error = %e, "Prompt handler failed");
                GetPromptResponse::error(
                    e.reported_message()
                        .unwrap_or_else(|| format!("Unknown error rendering prompt: {}", name)),
                )
            }
            Err(payload) => {
                tracing::error!(prompt = %name, "Prompt handler panicked");
                GetPromptResponse::error(
                    panic_message(&*payload)
                        .unwrap_or_else(|| format!("Unknown error rendering prompt: {}", name)),
                )
            }
        }
    }

    /// Handle a raw request by method name
    pub async fn handle(&self, method: &str, params: Value) -> Result<Value, DispatchError> {
        let response = match method {
            "ping" => Value::Object(Default::default()),
            "tools/list" => serde_json::to_value(self.list_tools())?,
            "prompts/list" => serde_json::to_value(self.list_prompts())?,
            "resources/list" => serde_json::to_value(self.list_resources())?,
            "resources/templates/list" => serde_json::to_value(self.list_resource_templates())?,
            "tools/call" => {
                let p: CallToolParams = parse_params(method, params)?;
                serde_json::to_value(self.call_tool(&p.name, p.arguments).await)?
            }
            "resources/read" => {
                let p: ReadResourceParams = parse_params(method, params)?;
                serde_json::to_value(self.read_resource(&p.uri, p.arguments).await)?
            }
            "prompts/get" => {
                let p: GetPromptParams = parse_params(method, params)?;
                serde_json::to_value(self.get_prompt(&p.name, p.arguments))?
            }
            other => return Err(DispatchError::MethodNotFound(other.to_string())),
        };

        Ok(response)
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    method: &str,
    params: Value,
) -> Result<T, DispatchError> {
    serde_json::from_value(params).map_err(|e| DispatchError::InvalidParams {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{
        prompt_fn, tool_fn, HandlerError, PromptArgument, ResourcePayload, ResourceResult,
        resource_fn,
    };
    use serde_json::json;

    async fn echo(args: Arguments) -> Result<ToolResult, HandlerError> {
        let msg = args
            .get("msg")
            .and_then(Value::as_str)
            .ok_or_else(|| HandlerError::MissingArgument("msg".into()))?;
        Ok(ToolResult::text(msg))
    }

    fn dispatcher() -> Dispatcher {
        let registry = CapabilityRegistry::new();

        registry
            .register_tool(
                ToolDescriptor::new("echo", "Echo a message"),
                tool_fn(echo),
            )
            .unwrap();

        registry
            .register_prompt(
                PromptDescriptor::new("greet", "Greet someone")
                    .argument(PromptArgument::required("who", "Who to greet")),
                prompt_fn(|args| {
                    let who = args.get("who").cloned().unwrap_or_default();
                    if who == "nobody" {
                        return Err(HandlerError::message("cannot greet nobody"));
                    }
                    Ok(vec![PromptMessage::user(format!("Hello {}", who))])
                }),
            )
            .unwrap();

        registry
            .register_resource(
                ResourceDescriptor::uri("thing:///hello", "hello"),
                resource_fn(|_| async { Ok(ResourceResult::ok(ResourcePayload::text("hello"))) }),
            )
            .unwrap();

        Dispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_call_tool_echo() {
        let mut args = Arguments::new();
        args.insert("msg".into(), json!("hi"));

        let result = dispatcher().call_tool("echo", Some(args)).await;
        assert!(!result.is_error);
        assert_eq!(result.joined_text(), "hi");
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let result = dispatcher().call_tool("nope", None).await;
        assert!(result.is_error);
        assert_eq!(result.joined_text(), "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_call_tool_error_becomes_content() {
        let result = dispatcher().call_tool("echo", None).await;
        assert!(result.is_error);
        assert_eq!(result.joined_text(), "Missing required argument: msg");
    }

    #[test]
    fn test_get_prompt() {
        let mut args = PromptArguments::new();
        args.insert("who".into(), "team".into());

        let response = dispatcher().get_prompt("greet", Some(args));
        assert!(!response.is_error);
        assert_eq!(response.description.as_deref(), Some("Greet someone"));
        assert_eq!(response.messages, vec![PromptMessage::user("Hello team")]);
    }

    #[test]
    fn test_get_prompt_failures() {
        let d = dispatcher();

        let unknown = d.get_prompt("nope", None);
        assert!(unknown.is_error);
        assert!(unknown.messages.is_empty());
        assert_eq!(unknown.error_message.as_deref(), Some("Unknown prompt: nope"));

        let missing = d.get_prompt("greet", None);
        assert_eq!(
            missing.error_message.as_deref(),
            Some("Missing required argument: who")
        );

        let mut args = PromptArguments::new();
        args.insert("who".into(), "nobody".into());
        let failed = d.get_prompt("greet", Some(args));
        assert!(failed.is_error);
        assert_eq!(failed.error_message.as_deref(), Some("cannot greet nobody"));
    }

    #[tokio::test]
    async fn test_read_resource_shapes() {
        let d = dispatcher();

        let ok = d.read_resource("thing:///hello", None).await;
        assert!(!ok.is_error);
        assert_eq!(ok.contents.len(), 1);

        let missing = d.read_resource("thing:///missing", None).await;
        assert!(missing.is_error);
        assert!(missing.not_found);
        assert!(missing.contents.is_empty());
        assert_eq!(
            serde_json::to_value(&missing).unwrap(),
            json!({"contents": [], "isError": true, "errorMessage": "Resource not found: thing:///missing"})
        );
    }

    #[tokio::test]
    async fn test_handle_routes_methods() {
        let d = dispatcher();

        let tools = d.handle("tools/list", Value::Null).await.unwrap();
        assert_eq!(tools["tools"][0]["name"], "echo");

        let templates = d.handle("resources/templates/list", Value::Null).await.unwrap();
        assert_eq!(templates, json!({"resourceTemplates": []}));

        let called = d
            .handle("tools/call", json!({"name": "echo", "arguments": {"msg": "hi"}}))
            .await
            .unwrap();
        assert_eq!(called, json!({"content": [{"type": "text", "text": "hi"}]}));

        let read = d
            .handle("resources/read", json!({"uri": "thing:///hello"}))
            .await
            .unwrap();
        assert_eq!(read["contents"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn test_handle_errors() {
        let d = dispatcher();

        assert!(matches!(
            d.handle("bogus/method", Value::Null).await,
            Err(DispatchError::MethodNotFound(_))
        ));
        assert!(matches!(
            d.handle("tools/call", json!({"arguments": {}})).await,
            Err(DispatchError::InvalidParams { .. })
        ));
    }
}
