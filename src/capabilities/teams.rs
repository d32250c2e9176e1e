//! Team and workflow-state tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::args::{limit, limit_property, object_schema, optional_str, required_str};
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
        ToolDescriptor::new("linear_list_teams", "List teams in the Linear workspace")
            .with_input_schema(object_schema(json!({ "limit": limit_property() }), &[])),
        tracker_tool(ListTeamsHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new(
            "linear_get_team",
            "Get a team with its workflow states and members",
        )
        .with_input_schema(object_schema(
            json!({
                "id": {
                    "type": "string",
                    "description": "Team ID or key (e.g., 'ENG')"
                }
            }),
            &["id"],
        )),
        tracker_tool(GetTeamHandler {
            tracker: tracker.clone(),
        }),
    )?;

    registry.register_tool(
        ToolDescriptor::new(
            "linear_list_workflow_states",
            "List workflow states (Backlog, Todo, In Progress, ...), optionally for one team",
        )
        .with_input_schema(object_schema(
            json!({
                "teamId": {
                    "type": "string",
                    "description": "Team ID or key. If not specified, states of all teams are returned."
                }
            }),
            &[],
        )),
        tracker_tool(ListWorkflowStatesHandler {
            tracker: tracker.clone(),
        }),
    )?;

    Ok(())
}

#[derive(Debug)]
struct ListTeamsHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListTeamsHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let teams = self.tracker.list_teams(limit(&args)?).await?;
        ToolResult::json(&teams)
    }
}

#[derive(Debug)]
struct GetTeamHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for GetTeamHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let id = required_str(&args, "id")?;
        let team = self.tracker.get_team(id).await?;
        ToolResult::json(&team)
    }
}

#[derive(Debug)]
struct ListWorkflowStatesHandler {
    tracker: Arc<dyn IssueTracker>,
}

#[async_trait]
impl ToolHandler for ListWorkflowStatesHandler {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        let team_id = optional_str(&args, "teamId")?;
        let states = self.tracker.list_workflow_states(team_id).await?;
        ToolResult::json(&states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Team, WorkflowState};
    use crate::tracker::MockTracker;

    fn registry() -> CapabilityRegistry {
        let tracker: Arc<dyn IssueTracker> = Arc::new(MockTracker::with_fixtures());
        let registry = CapabilityRegistry::new();
        register(&registry, &tracker).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_list_teams_is_summary() {
        let registry = registry();
        let handler = registry.get_tool_handler("linear_list_teams").unwrap();
        let result = handler.call(Arguments::new()).await.unwrap();

        let teams: Vec<Team> = serde_json::from_str(&result.joined_text()).unwrap();
        assert_eq!(teams.len(), 1);
        assert!(teams[0].states.is_empty());
    }

    #[tokio::test]
    async fn test_get_team_by_key() {
        let registry = registry();
        let handler = registry.get_tool_handler("linear_get_team").unwrap();

        let mut args = Arguments::new();
        args.insert("id".into(), json!("ENG"));
        let result = handler.call(args).await.unwrap();

        let team: Team = serde_json::from_str(&result.joined_text()).unwrap();
        assert_eq!(team.id, "team-eng");
        assert_eq!(team.members.len(), 2);
    }

    #[tokio::test]
    async fn test_workflow_states_for_team() {
        let registry = registry();
        let handler = registry
            .get_tool_handler("linear_list_workflow_states")
            .unwrap();

        let mut args = Arguments::new();
        args.insert("teamId".into(), json!("team-eng"));
        let result = handler.call(args).await.unwrap();

        let states: Vec<WorkflowState> = serde_json::from_str(&result.joined_text()).unwrap();
        let names: Vec<&str> = states.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Backlog", "Todo", "In Progress", "Done", "Canceled"]);
    }
}
