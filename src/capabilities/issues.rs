//! Issue, comment and attachment tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::args::{
    limit, limit_property, object_schema, optional_bool, optional_date, optional_f64,
    optional_priority, optional_str, optional_string_list, required_str,
};
use super::tracker_tool;
use crate::models::{IssueDraft, IssueFilter, IssueUpdate};
use crate::registry::{
    Arguments, CapabilityRegistry, HandlerError, RegistrationError, ToolDescriptor, ToolHandler,
    ToolResult,
};
use crate::tracker::IssueTracker;

/// Properties shared by the create and update schemas
fn issue_fields() -> serde_json::Map<String, Value> {
    let fields = json!({
        "title": { "type": "string", "description": "Issue title" },
        "description": { "type": "string", "description": "Markdown description" },
        "priority": {
            "type": "integer",
            "description": "0 = no priority, 1 = urgent, 2 = high, 3 = medium, 4 = low",
            "minimum": 0,
            "maximum": 4
        },
        "assigneeId": { "type": "string", "description": "User ID of the assignee" },
        "stateId": { "type": "string", "description": "Workflow state ID" },
        "projectId": { "type": "string", "description": "Project ID" },
        "labelIds": {
            "type": "array",
            "items": { "type": "string" },
            "description": "Label IDs"
        },
        "dueDate": { "type": "string", "description": "Due date (YYYY-MM-DD)" },
        "estimate": { "type": "number", "description": "Estimate in points" }
    });
    match fields {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

pub(super) fn register(
    registry: &CapabilityRegistry,
    tracker: &Arc<dyn IssueTracker>,
) -> Result<(), RegistrationError> {
    registry.register_tool(
        ToolDescriptor::new(
            "linear_list_issues",
            "List issues, most recently updated first, filtered by team, assignee, state, project or label",
        )
        .with_input_schema(object_schema(
            json!({
                "teamId": { "type": "string", "description": "Team ID or key (e.g., 'ENG')" },
                "assigneeId": {
                    "type": "string",
                    "description": "User ID of the assignee, or 'me' for the API key's owner"
                },
                "state": { "type": "string", "description": "Workflow state name (e.g., 'In Progress')" },
                "projectId": { "type": "string", "description": "Project ID" },
                "label": { "type": "string", "description": "Label name" },
                "includeArchived": {
                    "type": "boolean",
                    "description": "Include archived issues",
                    "default": false
                },
                "limit": limit_property()
            }),
            &[],
        )),
        tracker_tool(ListIssuesHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new("linear_get_issue", "Get an issue by ID or identifier")
            .with_input_schema(object_schema(
                json!({
                    "id": {
                        "type": "string",
                        "description": "Issue ID or identifier (e.g., 'ENG-123')"
                    }
                }),
                &["id"],
            )),
        tracker_tool(GetIssueHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new(
            "linear_search_issues",
            "Full-text search over issue titles, descriptions and identifiers",
        )
        .with_input_schema(object_schema(
            json!({
                "query": { "type": "string", "description": "Search terms" },
                "limit": limit_property()
            }),
            &["query"],
        )),
        tracker_tool(SearchIssuesHandler {
            tracker: tracker.clone(),
        }),
    )?;

    let mut create_fields = issue_fields();
    create_fields.insert(
        "teamId".into(),
        json!({ "type": "string", "description": "Team ID or key the issue belongs to" }),
    );
    registry.register_tool(
        ToolDescriptor::new("linear_create_issue", "Create a new issue")
            .with_input_schema(object_schema(
                Value::Object(create_fields),
                &["teamId", "title"],
            )),
        tracker_tool(CreateIssueHandler {
            tracker: tracker.clone(),
        }),
    )?;

    let mut update_fields = issue_fields();
    update_fields.insert(
        "id".into(),
        json!({ "type": "string", "description": "Issue ID or identifier (e.g., 'ENG-123')" }),
    );
    registry.register_tool(
        ToolDescriptor::new(
            "linear_update_issue",
            "Update fields of an existing issue; omitted fields are left unchanged",
        )
        .with_input_schema(object_schema(Value::Object(update_fields), &["id"])),
        tracker_tool(UpdateIssueHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new("linear_list_comments", "List comments on an issue")
            .with_input_schema(object_schema(
                json!({ "issueId": { "type": "string", "description": "Issue ID or identifier" } }),
                &["issueId"],
            )),
        tracker_tool(ListCommentsHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new("linear_add_comment", "Add a comment to an issue")
            .with_input_schema(object_schema(
                json!({
                    "issueId": { "type": "string", "description": "Issue ID or identifier" },
                    "body": { "type": "string", "description": "Markdown comment body" }
                }),
                &["issueId", "body"],
            )),
        tracker_tool(AddCommentHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new(
            "linear_list_attachments",
            "List links attached to an issue (pull requests, documents, ...)",
        )
        .with_input_schema(object_schema(
            json!({ "issueId": { "type": "string", "description": "Issue ID or identifier" } }),
            &["issueId"],
        )),
        tracker_tool(ListAttachmentsHandler {
            tracker: tracker.clone(),
        }),
    )?;

    Ok(())
}

#[derive(Debug)]
struct ListIssuesHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListIssuesHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let assignee_id = match optional_str(&args, "assigneeId")? {
            Some(me) if me.eq_ignore_ascii_case("me") => Some(self.tracker.viewer().await?.id),
            other => other.map(String::from),
        };

        let filter = IssueFilter {
            team_id: optional_str(&args, "teamId")?.map(String::from),
            assignee_id,
            state: optional_str(&args, "state")?.map(String::from),
            project_id: optional_str(&args, "projectId")?.map(String::from),
            label: optional_str(&args, "label")?.map(String::from),
            include_archived: optional_bool(&args, "includeArchived")?.unwrap_or(false),
            limit: limit(&args)?,
        };

        tracing::debug!(?filter, "Listing issues");
        let issues = self.tracker.list_issues(&filter).await?;
        ToolResult::json(&issues)
    }
}

#[derive(Debug)]
struct GetIssueHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for GetIssueHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let id = required_str(&args, "id")?;
        let issue = self.tracker.get_issue(id).await?;
        ToolResult::json(&issue)
    }
}

#[derive(Debug)]
struct SearchIssuesHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for SearchIssuesHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let query = required_str(&args, "query")?;
        let issues = self.tracker.search_issues(query, limit(&args)?).await?;
        ToolResult::json(&issues)
    }
}

#[derive(Debug)]
struct CreateIssueHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for CreateIssueHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let draft = IssueDraft {
            team_id: required_str(&args, "teamId")?.to_string(),
            title: required_str(&args, "title")?.to_string(),
            description: optional_str(&args, "description")?.map(String::from),
            priority: optional_priority(&args)?,
            assignee_id: optional_str(&args, "assigneeId")?.map(String::from),
            state_id: optional_str(&args, "stateId")?.map(String::from),
            project_id: optional_str(&args, "projectId")?.map(String::from),
            label_ids: optional_string_list(&args, "labelIds")?.unwrap_or_default(),
            due_date: optional_date(&args, "dueDate")?,
            estimate: optional_f64(&args, "estimate")?,
        };

        let issue = self.tracker.create_issue(&draft).await?;
        ToolResult::json(&issue)
    }
}

#[derive(Debug)]
struct UpdateIssueHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for UpdateIssueHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let id = required_str(&args, "id")?;
        let update = IssueUpdate {
            title: optional_str(&args, "title")?.map(String::from),
            description: optional_str(&args, "description")?.map(String::from),
            priority: optional_priority(&args)?,
            assignee_id: optional_str(&args, "assigneeId")?.map(String::from),
            state_id: optional_str(&args, "stateId")?.map(String::from),
            project_id: optional_str(&args, "projectId")?.map(String::from),
            label_ids: optional_string_list(&args, "labelIds")?,
            due_date: optional_date(&args, "dueDate")?,
            estimate: optional_f64(&args, "estimate")?,
        };

        if update.is_empty() {
            return Err(HandlerError::message(
                "Nothing to update: provide at least one field besides 'id'",
            ));
        }

        let issue = self.tracker.update_issue(id, &update).await?;
        ToolResult::json(&issue)
    }
}

#[derive(Debug)]
struct ListCommentsHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListCommentsHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let issue_id = required_str(&args, "issueId")?;
        let comments = self.tracker.list_comments(issue_id).await?;
        ToolResult::json(&comments)
    }
}

#[derive(Debug)]
struct AddCommentHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for AddCommentHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let issue_id = required_str(&args, "issueId")?;
        let body = required_str(&args, "body")?;
        let comment = self.tracker.add_comment(issue_id, body).await?;
        ToolResult::json(&comment)
    }
}

#[derive(Debug)]
struct ListAttachmentsHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListAttachmentsHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let issue_id = required_str(&args, "issueId")?;
        let attachments = self.tracker.list_attachments(issue_id).await?;
        ToolResult::json(&attachments)
    }
}
