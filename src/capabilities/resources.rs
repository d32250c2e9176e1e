//! `linear://` resources and resource templates.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::args::{required_str, MAX_LIMIT};
use super::{tracker_resource, JSON_MIME};
use crate::models::IssueFilter;
use crate::registry::{
    Arguments, CapabilityRegistry, HandlerError, RegistrationError, ResourceDescriptor,
    ResourceHandler, ResourcePayload, ResourceResult,
};
use crate::tracker::IssueTracker;

/// What a `linear://` resource reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entity {
    Viewer,
    Teams,
    Projects,
    Team,
    TeamIssues,
    Issue,
    Project,
}

pub(super) fn register(
    registry: &CapabilityRegistry,
    tracker: &Arc<dyn IssueTracker>,
) -> Result<(), RegistrationError> {
    let entries = [
        (
            ResourceDescriptor::uri("linear://viewer", "Viewer")
                .with_description("The user that owns the API key"),
            Entity::Viewer,
        ),
        (
            ResourceDescriptor::uri("linear://teams", "Teams")
                .with_description("All teams in the workspace"),
            Entity::Teams,
        ),
        (
            ResourceDescriptor::uri("linear://projects", "Projects")
                .with_description("All projects in the workspace"),
            Entity::Projects,
        ),
        (
            ResourceDescriptor::template("linear://teams/{teamId}", "Team")
                .with_description("A team with its workflow states and members"),
            Entity::Team,
        ),
        (
            ResourceDescriptor::template("linear://teams/{teamId}/issues", "Team issues")
                .with_description("Recently updated issues of a team"),
            Entity::TeamIssues,
        ),
        (
            ResourceDescriptor::template("linear://issues/{issueId}", "Issue")
                .with_description("An issue with its comments"),
            Entity::Issue,
        ),
        (
            ResourceDescriptor::template("linear://projects/{projectId}", "Project")
                .with_description("A project with its milestones"),
            Entity::Project,
        ),
    ];

    for (descriptor, entity) in entries {
        registry.register_resource(
            descriptor.with_mime_type(JSON_MIME),
            tracker_resource(LinearResource {
                tracker: tracker.clone(),
                entity,
            }),
        )?;
    }

    Ok(())
}

#[derive(Debug)]
struct LinearResource {
    tracker: Arc<dyn IssueTracker>,
    entity: Entity,
}

#[async_trait]
impl ResourceHandler for LinearResource {
    async fn read(&self, args: Arguments) -> Result<ResourceResult, HandlerError> {
        let tracker = &self.tracker;
        let payload = match self.entity {
            Entity::Viewer => ResourcePayload::json(&tracker.viewer().await?)?,
            Entity::Teams => ResourcePayload::json(&tracker.list_teams(MAX_LIMIT).await?)?,
            Entity::Projects => ResourcePayload::json(&tracker.list_projects(MAX_LIMIT).await?)?,
            Entity::Team => {
                let team_id = required_str(&args, "teamId")?;
                ResourcePayload::json(&tracker.get_team(team_id).await?)?
            }
            Entity::TeamIssues => {
                let team_id = required_str(&args, "teamId")?;
                let issues = tracker.list_issues(&IssueFilter::for_team(team_id)).await?;
                ResourcePayload::json(&issues)?
            }
            Entity::Issue => {
                let issue_id = required_str(&args, "issueId")?;
                let issue = tracker.get_issue(issue_id).await?;
                let comments = tracker.list_comments(&issue.id).await?;
                ResourcePayload::json(&json!({ "issue": issue, "comments": comments }))?
            }
            Entity::Project => {
                let project_id = required_str(&args, "projectId")?;
                let project = tracker.get_project(project_id).await?;
                let milestones = tracker.list_project_milestones(&project.id).await?;
                ResourcePayload::json(&json!({ "project": project, "milestones": milestones }))?
            }
        };

        Ok(ResourceResult::ok(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ResourceReadError;
    use crate::tracker::{MockTracker, TrackerError};
    use serde_json::Value;

    fn setup() -> (CapabilityRegistry, Arc<MockTracker>) {
        let mock = Arc::new(MockTracker::with_fixtures());
        let tracker: Arc<dyn IssueTracker> = mock.clone();
        let registry = CapabilityRegistry::new();
        register(&registry, &tracker).unwrap();
        (registry, mock)
    }

    async fn read_json(registry: &CapabilityRegistry, uri: &str) -> Value {
        let content = registry.read_resource(uri, None).await.unwrap();
        assert_eq!(content.uri, uri);
        assert_eq!(content.mime_type.as_deref(), Some(JSON_MIME));
        serde_json::from_str(content.text().unwrap()).unwrap()
    }

    #[test]
    fn test_partition() {
        let (registry, _) = setup();
        let literal: Vec<String> = registry
            .get_all_resources()
            .iter()
            .filter_map(|d| d.literal_uri().map(String::from))
            .collect();
        assert_eq!(
            literal,
            ["linear://projects", "linear://teams", "linear://viewer"]
        );
        assert_eq!(registry.get_resource_templates().len(), 4);
    }

    #[tokio::test]
    async fn test_read_literal_resources() {
        let (registry, _) = setup();
        let viewer = read_json(&registry, "linear://viewer").await;
        assert_eq!(viewer["name"], "Ada Lovelace");

        let teams = read_json(&registry, "linear://teams").await;
        assert_eq!(teams[0]["key"], "ENG");
    }

    #[tokio::test]
    async fn test_team_issues_template_beats_team_template() {
        let (registry, _) = setup();
        let issues = read_json(&registry, "linear://teams/ENG/issues").await;
        assert_eq!(issues.as_array().map(Vec::len), Some(3));

        let team = read_json(&registry, "linear://teams/ENG").await;
        assert_eq!(team["id"], "team-eng");
    }

    #[tokio::test]
    async fn test_issue_with_comments() {
        let (registry, _) = setup();
        let value = read_json(&registry, "linear://issues/ENG-1").await;
        assert_eq!(value["issue"]["identifier"], "ENG-1");
        assert_eq!(value["comments"][0]["body"], "Reproduced on staging.");
    }

    #[tokio::test]
    async fn test_project_with_milestones() {
        let (registry, _) = setup();
        let value = read_json(&registry, "linear://projects/project-launch").await;
        assert_eq!(value["milestones"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_tracker_failure_reported() {
        let (registry, mock) = setup();
        mock.fail_with(TrackerError::Network("connection reset".into()));

        let err = registry
            .read_resource("linear://viewer", None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ResourceReadError::Reported("Network error: connection reset".into())
        );
    }

    #[tokio::test]
    async fn test_unknown_issue_reported() {
        let (registry, _) = setup();
        let err = registry
            .read_resource("linear://issues/ENG-404", None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ResourceReadError::Reported("Not found: issue ENG-404".into())
        );
    }
}
