//! Integration tests for Linear MCP
//!
//! These tests exercise the capability registry, the dispatcher and the Linear
//! capabilities end to end against the in-memory tracker.

use linear_mcp::capabilities::register_all;
use linear_mcp::mcp::{Dispatcher, McpServer};
use linear_mcp::registry::{
    prompt_fn, resource_fn, tool_fn, Arguments, CapabilityRegistry, HandlerError, PromptArgument,
    PromptDescriptor, PromptMessage, ResourceDescriptor, ResourcePayload, ResourceReadError,
    ResourceResult, ToolDescriptor, ToolResult,
};
use linear_mcp::tracker::{IssueTracker, MockTracker, TrackerError};
use serde_json::{json, Value};
use std::sync::Arc;

fn text_resource(text: &'static str) -> Arc<dyn linear_mcp::registry::ResourceHandler> {
    resource_fn(move |_args: Arguments| async move {
        Ok(ResourceResult::ok(ResourcePayload::text(text)))
    })
}

async fn echo(args: Arguments) -> Result<ToolResult, HandlerError> {
    Ok(ToolResult::text(Value::Object(args).to_string()))
}

/// A registry backed by the sample workspace
fn linear_setup() -> (Dispatcher, Arc<MockTracker>) {
    let mock = Arc::new(MockTracker::with_fixtures());
    let tracker: Arc<dyn IssueTracker> = mock.clone();
    let registry = Arc::new(CapabilityRegistry::new());
    register_all(&registry, tracker).unwrap();
    (Dispatcher::new(registry), mock)
}

fn args(value: Value) -> Option<Arguments> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

// ========== REGISTRY ==========

/// Re-registering under the same key replaces descriptor and handler together
#[tokio::test]
async fn test_registration_overwrites() {
    let registry = CapabilityRegistry::new();
    registry
        .register_resource(
            ResourceDescriptor::uri("notes://today", "Old"),
            text_resource("old"),
        )
        .unwrap();
    registry
        .register_resource(
            ResourceDescriptor::uri("notes://today", "New"),
            text_resource("new"),
        )
        .unwrap();

    assert_eq!(registry.get_all_resources().len(), 1);
    assert_eq!(registry.get_resource("notes://today").unwrap().name, "New");

    let content = registry.read_resource("notes://today", None).await.unwrap();
    assert_eq!(content.text(), Some("new"));
}

/// The same key in different kinds never collides
#[test]
fn test_kinds_are_isolated() {
    let registry = CapabilityRegistry::new();
    registry
        .register_tool(ToolDescriptor::new("status", "tool"), tool_fn(echo))
        .unwrap();
    registry
        .register_prompt(
            PromptDescriptor::new("status", "prompt"),
            prompt_fn(|_| Ok(vec![PromptMessage::user("hi")])),
        )
        .unwrap();
    registry
        .register_resource(ResourceDescriptor::uri("status", "resource"), text_resource("ok"))
        .unwrap();

    assert_eq!(registry.get_tool("status").unwrap().description.as_deref(), Some("tool"));
    assert_eq!(
        registry.get_prompt_by_name("status").unwrap().description.as_deref(),
        Some("prompt")
    );
    assert_eq!(registry.get_resource("status").unwrap().name, "resource");
}

#[test]
fn test_empty_keys_rejected() {
    let registry = CapabilityRegistry::new();
    assert!(registry
        .register_tool(ToolDescriptor::new("", "nameless"), tool_fn(echo))
        .is_err());
    assert!(registry
        .register_resource(ResourceDescriptor::uri("", "nameless"), text_resource("x"))
        .is_err());
    assert!(registry.get_all_tools().is_empty());
    assert!(registry.get_all_resources().is_empty());
}

#[test]
fn test_unknown_lookups_are_none() {
    let registry = CapabilityRegistry::new();
    assert!(registry.get_tool("missing").is_none());
    assert!(registry.get_tool_handler("missing").is_none());
    assert!(registry.get_prompt_by_name("missing").is_none());
    assert!(registry.get_resource_handler("missing://x").is_none());
}

/// Literal resources and templates are listed apart, each exactly once
#[test]
fn test_resource_partition() {
    let registry = CapabilityRegistry::new();
    registry
        .register_resource(ResourceDescriptor::uri("docs://index", "Index"), text_resource("i"))
        .unwrap();
    registry
        .register_resource(
            ResourceDescriptor::template("docs://pages/{page}", "Page"),
            text_resource("p"),
        )
        .unwrap();

    let literal = registry.get_all_resources();
    let templates = registry.get_resource_templates();
    assert_eq!(literal.len(), 1);
    assert_eq!(templates.len(), 1);
    assert_eq!(literal[0].literal_uri(), Some("docs://index"));
    assert_eq!(templates[0].uri_template(), Some("docs://pages/{page}"));
}

// ========== RESOURCE READING ==========

#[tokio::test]
async fn test_read_backfills_uri_and_passes_variables() {
    let registry = CapabilityRegistry::new();
    registry
        .register_resource(
            ResourceDescriptor::template("docs://pages/{page}", "Page"),
            resource_fn(|args: Arguments| async move {
                Ok(ResourceResult::ok(ResourcePayload::text(
                    Value::Object(args).to_string(),
                )))
            }),
        )
        .unwrap();

    let content = registry
        .read_resource("docs://pages/intro", args(json!({ "lang": "en" })))
        .await
        .unwrap();
    assert_eq!(content.uri, "docs://pages/intro");

    let seen: Value = serde_json::from_str(content.text().unwrap()).unwrap();
    assert_eq!(seen, json!({ "page": "intro", "lang": "en" }));
}

#[tokio::test]
async fn test_read_unknown_uri() {
    let registry = CapabilityRegistry::new();
    let err = registry.read_resource("docs://nothing", None).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Resource not found: docs://nothing");
}

#[tokio::test]
async fn test_read_missing_content() {
    let registry = CapabilityRegistry::new();
    registry
        .register_resource(
            ResourceDescriptor::uri("docs://empty", "Empty"),
            resource_fn(|_| async { Ok(ResourceResult::ok(ResourcePayload::default())) }),
        )
        .unwrap();

    let err = registry.read_resource("docs://empty", None).await.unwrap_err();
    assert_eq!(
        err,
        ResourceReadError::MissingContent {
            uri: "docs://empty".into()
        }
    );
}

#[tokio::test]
async fn test_read_survives_panicking_handler() {
    let registry = CapabilityRegistry::new();
    registry
        .register_resource(
            ResourceDescriptor::uri("docs://boom", "Boom"),
            resource_fn(|args: Arguments| async move {
                if args.is_empty() {
                    panic!("handler exploded");
                }
                Ok(ResourceResult::ok(ResourcePayload::text("unreachable")))
            }),
        )
        .unwrap();

    let err = registry.read_resource("docs://boom", None).await.unwrap_err();
    assert_eq!(err, ResourceReadError::Reported("handler exploded".into()));

    // The registry stays usable afterwards
    assert!(registry.get_resource("docs://boom").is_some());
}

// ========== DISPATCH ==========

#[tokio::test]
async fn test_dispatch_echo_roundtrip() {
    let registry = Arc::new(CapabilityRegistry::new());
    registry
        .register_tool(ToolDescriptor::new("echo", "Echo arguments"), tool_fn(echo))
        .unwrap();
    registry
        .register_prompt(
            PromptDescriptor::new("greet", "Greeting")
                .argument(PromptArgument::required("name", "Who to greet")),
            prompt_fn(|args| {
                Ok(vec![PromptMessage::user(format!(
                    "Hello, {}!",
                    args.get("name").map(String::as_str).unwrap_or_default()
                ))])
            }),
        )
        .unwrap();

    let server = McpServer::new(registry, "test-server");
    let dispatcher = server.dispatcher();

    let listed = dispatcher.handle("tools/list", Value::Null).await.unwrap();
    assert_eq!(listed["tools"][0]["name"], "echo");

    let called = dispatcher
        .handle(
            "tools/call",
            json!({ "name": "echo", "arguments": { "x": 1 } }),
        )
        .await
        .unwrap();
    assert_eq!(called["content"][0]["text"], r#"{"x":1}"#);

    let prompt = dispatcher
        .handle(
            "prompts/get",
            json!({ "name": "greet", "arguments": { "name": "Ada" } }),
        )
        .await
        .unwrap();
    assert_eq!(prompt["messages"][0]["content"]["text"], "Hello, Ada!");

    let missing = dispatcher.get_prompt("greet", None);
    assert!(missing.is_error);
}

#[tokio::test]
async fn test_dispatch_unknown_tool_is_error_result() {
    let dispatcher = Dispatcher::new(Arc::new(CapabilityRegistry::new()));
    let result = dispatcher.call_tool("nope", None).await;
    assert!(result.is_error);
    assert_eq!(result.joined_text(), "Unknown tool: nope");
}

// ========== LINEAR CAPABILITIES ==========

#[tokio::test]
async fn test_linear_capabilities_listed() {
    let (dispatcher, _) = linear_setup();
    let tools = dispatcher.list_tools().tools;
    assert!(tools.iter().any(|t| t.name == "linear_create_issue"));
    assert!(tools
        .windows(2)
        .all(|pair| pair[0].name <= pair[1].name));

    let templates = dispatcher.list_resource_templates().resource_templates;
    assert!(templates
        .iter()
        .any(|t| t.uri_template() == Some("linear://issues/{issueId}")));
}

#[tokio::test]
async fn test_issue_lifecycle_through_tools() {
    let (dispatcher, mock) = linear_setup();

    let created = dispatcher
        .call_tool(
            "linear_create_issue",
            args(json!({
                "teamId": "ENG",
                "title": "Dark mode flickers",
                "priority": 2,
            })),
        )
        .await;
    assert!(!created.is_error, "{}", created.joined_text());
    let issue: Value = serde_json::from_str(&created.joined_text()).unwrap();
    assert_eq!(issue["identifier"], "ENG-4");
    assert_eq!(issue["state"]["name"], "Todo");

    let commented = dispatcher
        .call_tool(
            "linear_add_comment",
            args(json!({ "issueId": "ENG-4", "body": "Seen on Safari only." })),
        )
        .await;
    assert!(!commented.is_error);

    let read = dispatcher.read_resource("linear://issues/ENG-4", None).await;
    assert!(!read.is_error);
    let value: Value = serde_json::from_str(read.contents[0].text().unwrap()).unwrap();
    assert_eq!(value["comments"][0]["body"], "Seen on Safari only.");

    assert_eq!(mock.issues().len(), 4);
}

#[tokio::test]
async fn test_list_issues_for_me() {
    let (dispatcher, _) = linear_setup();
    let result = dispatcher
        .call_tool("linear_list_issues", args(json!({ "assigneeId": "me" })))
        .await;
    let issues: Value = serde_json::from_str(&result.joined_text()).unwrap();
    let identifiers: Vec<&str> = issues
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["identifier"].as_str())
        .collect();
    assert_eq!(identifiers, ["ENG-1"]);
}

#[tokio::test]
async fn test_tracker_failures_become_error_results() {
    let (dispatcher, mock) = linear_setup();
    mock.fail_with(TrackerError::Unauthorized("bad key".into()));

    let result = dispatcher.call_tool("linear_get_viewer", None).await;
    assert!(result.is_error);
    assert_eq!(
        result.joined_text(),
        "Linear request failed: Unauthorized: bad key"
    );

    let read = dispatcher.read_resource("linear://teams", None).await;
    assert!(read.is_error);
    assert!(!read.not_found);
}

#[tokio::test]
async fn test_missing_argument_reported() {
    let (dispatcher, _) = linear_setup();
    let result = dispatcher.call_tool("linear_get_issue", None).await;
    assert!(result.is_error);
    assert_eq!(result.joined_text(), "Missing required argument: id");
}

#[tokio::test]
async fn test_prompt_rendering() {
    let (dispatcher, _) = linear_setup();
    let response = dispatcher.get_prompt(
        "triage-issue",
        Some([("issueId".to_string(), "ENG-2".to_string())].into()),
    );
    assert!(!response.is_error);
    assert_eq!(response.messages.len(), 2);
}
