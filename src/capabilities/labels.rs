//! Label tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::args::{object_schema, optional_str, required_str};
use super::tracker_tool;
use crate::models::LabelDraft;
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
            "linear_list_labels",
            "List issue labels, optionally those available to one team",
        )
        .with_input_schema(object_schema(
            json!({
                "teamId": {
                    "type": "string",
                    "description": "Team ID or key. Workspace labels are always included."
                }
            }),
            &[],
        )),
        tracker_tool(ListLabelsHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new("linear_create_label", "Create an issue label").with_input_schema(
            object_schema(
                json!({
                    "name": { "type": "string", "description": "Label name" },
                    "color": { "type": "string", "description": "Hex color (e.g., '#eb5757')" },
                    "description": { "type": "string", "description": "Label description" },
                    "teamId": {
                        "type": "string",
                        "description": "Team ID; omit for a workspace label"
                    }
                }),
                &["name"],
            ),
        ),
        tracker_tool(CreateLabelHandler {
            tracker: tracker.clone(),
        }),
    )?;

    Ok(())
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[derive(Debug)]
struct ListLabelsHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListLabelsHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let team_id = optional_str(&args, "teamId")?;
        let labels = self.tracker.list_labels(team_id).await?;
        ToolResult::json(&labels)
    }
}

#[derive(Debug)]
struct CreateLabelHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for CreateLabelHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let color = optional_str(&args, "color")?;
        if let Some(color) = color {
            if !is_hex_color(color) {
                return Err(HandlerError::invalid_argument(
                    "color",
                    "expected a hex color such as '#eb5757'",
                ));
            }
        }

        let draft = LabelDraft {
            name: required_str(&args, "name")?.to_string(),
            color: color.map(String::from),
            description: optional_str(&args, "description")?.map(String::from),
            team_id: optional_str(&args, "teamId")?.map(String::from),
        };

        let label = self.tracker.create_label(&draft).await?;
        ToolResult::json(&label)
    }
}
