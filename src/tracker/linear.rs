//! Linear GraphQL API client.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::graphql::{
    self, Connection, GqlAttachment, GqlComment, GqlIssue, GqlLabel, GqlMilestone, GqlProject,
    GqlState, GqlTeam, GqlUser, GraphQlError, GraphQlResponse, Payload,
};
use super::{IssueTracker, TrackerError};
use crate::models::{
    Attachment, Comment, Issue, IssueDraft, IssueFilter, IssueUpdate, Label, LabelDraft, Project,
    ProjectMilestone, Team, User, WorkflowState,
};
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// Public Linear GraphQL endpoint
pub const DEFAULT_API_URL: &str = "https://api.linear.app/graphql";

/// Issue tracker backed by Linear's GraphQL API
///
/// Personal API keys are sent verbatim in the `Authorization` header. A
/// client without a key can still be constructed; every request then fails
/// with [`TrackerError::Unauthorized`].
#[derive(Debug, Clone)]
pub struct LinearClient {
    http: HttpClient,
    api_url: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl LinearClient {
    /// Create a client for the public endpoint
    pub fn new(api_key: Option<String>) -> Result<Self, TrackerError> {
        Self::with_endpoint(api_key, DEFAULT_API_URL, Duration::from_secs(30))
    }

    /// Create a client for a custom endpoint
    pub fn with_endpoint(
        api_key: Option<String>,
        api_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TrackerError> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            api_url: api_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            retry: RetryConfig::default(),
        })
    }

    /// Override the retry policy
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run a query and deserialize the value found at `path` inside `data`
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
        path: &[&str],
    ) -> Result<T, TrackerError> {
        let data = with_retry(self.retry, || self.send(query, &variables)).await?;
        take(data, path)
    }

    /// Run a mutation whose payload carries `success` and the touched entity
    async fn mutate<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
        field: &'static str,
    ) -> Result<T, TrackerError> {
        let payload: Payload<T> = self.execute(query, variables, &[field]).await?;
        match payload.entity {
            Some(entity) if payload.success => Ok(entity),
            _ => Err(TrackerError::GraphQl(format!("{} did not succeed", field))),
        }
    }

    async fn send(&self, query: &str, variables: &Value) -> Result<Value, TrackerError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            TrackerError::Unauthorized("no Linear API key configured (set LINEAR_API_KEY)".into())
        })?;

        tracing::debug!(url = %self.api_url, "Sending Linear GraphQL request");

        let response = self
            .http
            .post_json(
                &self.api_url,
                api_key,
                &json!({ "query": query, "variables": variables }),
            )
            .send()
            .await
            .map_err(|e| TrackerError::Network(format!("Failed to reach Linear: {}", e)))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(TrackerError::RateLimit(retry_after));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TrackerError::Unauthorized(format!(
                "Linear API returned status: {}",
                status
            )));
        }
        if status.is_server_error() {
            return Err(TrackerError::Network(format!(
                "Linear API returned status: {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TrackerError::Network(format!("Failed to read response: {}", e)))?;

        // Linear answers invalid queries with 400 and a GraphQL error body
        let envelope: GraphQlResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(TrackerError::Api(format!(
                    "Linear API returned status: {}",
                    status
                )))
            }
            Err(e) => return Err(TrackerError::Parse(format!("Failed to parse JSON: {}", e))),
        };

        if let Some(error) = envelope.errors.first() {
            return Err(map_graphql_error(error));
        }
        if !status.is_success() {
            return Err(TrackerError::Api(format!(
                "Linear API returned status: {}",
                status
            )));
        }

        envelope
            .data
            .ok_or_else(|| TrackerError::Parse("response contained no data".into()))
    }
}

/// Classify the first GraphQL error of a response
fn map_graphql_error(error: &GraphQlError) -> TrackerError {
    let message = error.display_message().to_string();
    match error.code() {
        Some("RATELIMITED") => TrackerError::RateLimit(None),
        Some("AUTHENTICATION_ERROR") | Some("FORBIDDEN") => TrackerError::Unauthorized(message),
        _ if message.to_lowercase().contains("not found") => TrackerError::NotFound(message),
        _ => TrackerError::GraphQl(message),
    }
}

/// Walk `path` into `data`; a missing or null value is a not-found
fn take<T: DeserializeOwned>(mut data: Value, path: &[&str]) -> Result<T, TrackerError> {
    for key in path {
        data = match data.get_mut(*key).map(Value::take) {
            None | Some(Value::Null) => return Err(TrackerError::NotFound(path.join("."))),
            Some(value) => value,
        };
    }
    Ok(serde_json::from_value(data)?)
}

/// Rename a bare path not-found into one naming the entity
fn not_found_as(err: TrackerError, entity: &str, id: &str) -> TrackerError {
    match err {
        TrackerError::NotFound(_) => TrackerError::NotFound(format!("{} {}", entity, id)),
        other => other,
    }
}

fn looks_like_uuid(value: &str) -> bool {
    value.len() == 36 && value.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Team filter by UUID or by team key (`ENG`)
fn team_filter(team: &str) -> Value {
    if looks_like_uuid(team) {
        json!({ "id": { "eq": team } })
    } else {
        json!({ "key": { "eqIgnoreCase": team } })
    }
}

/// Build Linear's `IssueFilter` input
fn issue_filter(filter: &IssueFilter) -> Value {
    let mut f = Map::new();
    if let Some(team) = &filter.team_id {
        f.insert("team".into(), team_filter(team));
    }
    if let Some(assignee) = &filter.assignee_id {
        f.insert("assignee".into(), json!({ "id": { "eq": assignee } }));
    }
    if let Some(state) = &filter.state {
        f.insert("state".into(), json!({ "name": { "eqIgnoreCase": state } }));
    }
    if let Some(project) = &filter.project_id {
        f.insert("project".into(), json!({ "id": { "eq": project } }));
    }
    if let Some(label) = &filter.label {
        f.insert(
            "labels".into(),
            json!({ "some": { "name": { "eqIgnoreCase": label } } }),
        );
    }
    Value::Object(f)
}

#[async_trait]
impl IssueTracker for LinearClient {
    fn name(&self) -> &str {
        "Linear"
    }

    async fn viewer(&self) -> Result<User, TrackerError> {
        let user: GqlUser = self.execute(graphql::VIEWER, json!({}), &["viewer"]).await?;
        Ok(user.into())
    }

    async fn list_users(&self, limit: u32) -> Result<Vec<User>, TrackerError> {
        let users: Connection<GqlUser> = self
            .execute(graphql::USERS, json!({ "first": limit }), &["users"])
            .await?;
        Ok(users.into_vec())
    }

    async fn get_user(&self, id: &str) -> Result<User, TrackerError> {
        let user: GqlUser = self
            .execute(graphql::USER, json!({ "id": id }), &["user"])
            .await
            .map_err(|e| not_found_as(e, "user", id))?;
        Ok(user.into())
    }

    async fn list_teams(&self, limit: u32) -> Result<Vec<Team>, TrackerError> {
        let teams: Connection<GqlTeam> = self
            .execute(graphql::TEAMS, json!({ "first": limit }), &["teams"])
            .await?;
        Ok(teams.into_vec())
    }

    async fn get_team(&self, id: &str) -> Result<Team, TrackerError> {
        let team: GqlTeam = self
            .execute(graphql::TEAM, json!({ "id": id }), &["team"])
            .await
            .map_err(|e| not_found_as(e, "team", id))?;
        Ok(team.into())
    }

    async fn list_workflow_states(
        &self,
        team_id: Option<&str>,
    ) -> Result<Vec<WorkflowState>, TrackerError> {
        let filter = team_id.map(|t| json!({ "team": team_filter(t) }));
        let states: Connection<GqlState> = self
            .execute(
                graphql::WORKFLOW_STATES,
                json!({ "filter": filter }),
                &["workflowStates"],
            )
            .await?;
        let mut states: Vec<WorkflowState> = states.into_vec();
        states.sort_by(|a, b| a.position.total_cmp(&b.position));
        Ok(states)
    }

    async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, TrackerError> {
        let variables = json!({
            "filter": issue_filter(filter),
            "first": filter.limit,
            "includeArchived": filter.include_archived,
        });
        let issues: Connection<GqlIssue> =
            self.execute(graphql::ISSUES, variables, &["issues"]).await?;
        Ok(issues.into_vec())
    }

    async fn get_issue(&self, id: &str) -> Result<Issue, TrackerError> {
        let issue: GqlIssue = self
            .execute(graphql::ISSUE, json!({ "id": id }), &["issue"])
            .await
            .map_err(|e| not_found_as(e, "issue", id))?;
        Ok(issue.into())
    }

    async fn search_issues(&self, query: &str, limit: u32) -> Result<Vec<Issue>, TrackerError> {
        if query.trim().is_empty() {
            return Err(TrackerError::InvalidRequest("search query is empty".into()));
        }
        let issues: Connection<GqlIssue> = self
            .execute(
                graphql::SEARCH_ISSUES,
                json!({ "term": query, "first": limit }),
                &["searchIssues"],
            )
            .await?;
        Ok(issues.into_vec())
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<Issue, TrackerError> {
        let issue: GqlIssue = self
            .mutate(
                graphql::CREATE_ISSUE,
                json!({ "input": draft }),
                "issueCreate",
            )
            .await?;
        tracing::info!(identifier = %issue.identifier, "Created Linear issue");
        Ok(issue.into())
    }

    async fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<Issue, TrackerError> {
        if update.is_empty() {
            return Err(TrackerError::InvalidRequest("no fields to update".into()));
        }
        let issue: GqlIssue = self
            .mutate(
                graphql::UPDATE_ISSUE,
                json!({ "id": id, "input": update }),
                "issueUpdate",
            )
            .await
            .map_err(|e| not_found_as(e, "issue", id))?;
        Ok(issue.into())
    }

    async fn list_comments(&self, issue_id: &str) -> Result<Vec<Comment>, TrackerError> {
        let comments: Connection<GqlComment> = self
            .execute(
                graphql::COMMENTS,
                json!({ "id": issue_id }),
                &["issue", "comments"],
            )
            .await
            .map_err(|e| not_found_as(e, "issue", issue_id))?;
        Ok(comments.into_vec())
    }

    async fn add_comment(&self, issue_id: &str, body: &str) -> Result<Comment, TrackerError> {
        if body.trim().is_empty() {
            return Err(TrackerError::InvalidRequest("comment body is empty".into()));
        }
        let comment: GqlComment = self
            .mutate(
                graphql::CREATE_COMMENT,
                json!({ "input": { "issueId": issue_id, "body": body } }),
                "commentCreate",
            )
            .await?;
        Ok(comment.into())
    }

    async fn list_attachments(&self, issue_id: &str) -> Result<Vec<Attachment>, TrackerError> {
        let attachments: Connection<GqlAttachment> = self
            .execute(
                graphql::ATTACHMENTS,
                json!({ "id": issue_id }),
                &["issue", "attachments"],
            )
            .await
            .map_err(|e| not_found_as(e, "issue", issue_id))?;
        Ok(attachments.into_vec())
    }

    async fn list_projects(&self, limit: u32) -> Result<Vec<Project>, TrackerError> {
        let projects: Connection<GqlProject> = self
            .execute(graphql::PROJECTS, json!({ "first": limit }), &["projects"])
            .await?;
        Ok(projects.into_vec())
    }

    async fn get_project(&self, id: &str) -> Result<Project, TrackerError> {
        let project: GqlProject = self
            .execute(graphql::PROJECT, json!({ "id": id }), &["project"])
            .await
            .map_err(|e| not_found_as(e, "project", id))?;
        Ok(project.into())
    }

    async fn list_project_milestones(
        &self,
        project_id: &str,
    ) -> Result<Vec<ProjectMilestone>, TrackerError> {
        let milestones: Connection<GqlMilestone> = self
            .execute(
                graphql::PROJECT_MILESTONES,
                json!({ "id": project_id }),
                &["project", "projectMilestones"],
            )
            .await
            .map_err(|e| not_found_as(e, "project", project_id))?;
        let mut milestones: Vec<ProjectMilestone> = milestones.into_vec();
        milestones.sort_by(|a, b| a.sort_order.total_cmp(&b.sort_order));
        Ok(milestones)
    }

    async fn list_labels(&self, team_id: Option<&str>) -> Result<Vec<Label>, TrackerError> {
        let filter = team_id.map(|t| json!({ "team": team_filter(t) }));
        let labels: Connection<GqlLabel> = self
            .execute(graphql::LABELS, json!({ "filter": filter }), &["issueLabels"])
            .await?;
        Ok(labels.into_vec())
    }

    async fn create_label(&self, draft: &LabelDraft) -> Result<Label, TrackerError> {
        let label: GqlLabel = self
            .mutate(
                graphql::CREATE_LABEL,
                json!({ "input": draft }),
                "issueLabelCreate",
            )
            .await?;
        Ok(label.into())
    }
}
