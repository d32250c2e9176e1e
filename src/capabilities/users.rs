//! User tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::args::{limit, limit_property, object_schema, required_str};
use super::tracker_tool;
use crate::registry::{
    Arguments, CapabilityRegistry, HandlerError, RegistrationError, ToolDescriptor, ToolHandler,
    ToolResult,
};
use crate::tracker::IssueTracker;

pub(super) fn register(
    registry: &CapabilityRegistry,
    tracker: &Arc<dyn IssueTracker>,
) -> Result<(), RegistrationError> {
    registry.register_tool(
        ToolDescriptor::new(
            "linear_get_viewer",
            "Get the Linear user that owns the configured API key",
        ),
        tracker_tool(GetViewerHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new("linear_list_users", "List users in the Linear workspace")
            .with_input_schema(object_schema(json!({ "limit": limit_property() }), &[])),
        tracker_tool(ListUsersHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new("linear_get_user", "Get a Linear user by ID").with_input_schema(
            object_schema(
                json!({ "id": { "type": "string", "description": "User ID" } }),
                &["id"],
            ),
        ),
        tracker_tool(GetUserHandler {
            tracker: tracker.clone(),
        }),
    )?;

    Ok(())
}

#[derive(Debug)]
struct GetViewerHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for GetViewerHandler {
    async fn call(&self, _args: Arguments) -> Result<ToolResult, HandlerError> {
        let viewer = self.tracker.viewer().await?;
        ToolResult::json(&viewer)
    }
}

#[derive(Debug)]
struct ListUsersHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListUsersHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let users = self.tracker.list_users(limit(&args)?).await?;
        ToolResult::json(&users)
    }
}

#[derive(Debug)]
struct GetUserHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for GetUserHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let id = required_str(&args, "id")?;
        let user = self.tracker.get_user(id).await?;
        ToolResult::json(&user)
    }
}
