//! Project tools.

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
        ToolDescriptor::new("linear_list_projects", "List projects in the Linear workspace")
            .with_input_schema(object_schema(json!({ "limit": limit_property() }), &[])),
        tracker_tool(ListProjectsHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new(
            "linear_get_project",
            "Get a project with its lead, teams, progress and dates",
        )
        .with_input_schema(object_schema(
            json!({ "id": { "type": "string", "description": "Project ID" } }),
            &["id"],
        )),
        tracker_tool(GetProjectHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new(
            "linear_list_project_milestones",
            "List the milestones of a project in order",
        )
        .with_input_schema(object_schema(
            json!({ "projectId": { "type": "string", "description": "Project ID" } }),
            &["projectId"],
        )),
        tracker_tool(ListMilestonesHandler {
            tracker: tracker.clone(),
        }),
    )?;

    Ok(())
}

#[derive(Debug)]
struct ListProjectsHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListProjectsHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let projects = self.tracker.list_projects(limit(&args)?).await?;
        ToolResult::json(&projects)
    }
}

#[derive(Debug)]
struct GetProjectHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for GetProjectHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let id = required_str(&args, "id")?;
        let project = self.tracker.get_project(id).await?;
        ToolResult::json(&project)
    }
}

#[derive(Debug)]
struct ListMilestonesHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListMilestonesHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let project_id = required_str(&args, "projectId")?;
        let milestones = self.tracker.list_project_milestones(project_id).await?;
        ToolResult::json(&milestones)
    }
}
