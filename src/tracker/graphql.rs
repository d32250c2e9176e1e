//! GraphQL documents and raw response shapes for the Linear API.
//!
//! Raw `Gql*` types mirror Linear's schema (connections wrap lists in
//! `nodes`); `From` impls flatten them into [`crate::models`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::{
    priority_label, Attachment, Comment, Issue, Label, Project, ProjectMilestone, Ref, StateRef,
    Team, User, WorkflowState,
};

macro_rules! user_fields {
    () => {
        "fragment UserFields on User { id name displayName email active admin avatarUrl createdAt }"
    };
}

macro_rules! state_fields {
    () => {
        "fragment StateFields on WorkflowState { id name type color position }"
    };
}

macro_rules! team_fields {
    () => {
        "fragment TeamFields on Team { id key name description private createdAt }"
    };
}

macro_rules! issue_fields {
    () => {
        "fragment IssueFields on Issue { \
            id identifier title description priority priorityLabel estimate url dueDate \
            createdAt updatedAt completedAt \
            state { id name type } \
            assignee { id name } \
            team { id name } \
            project { id name } \
            labels { nodes { name } } \
        }"
    };
}

macro_rules! comment_fields {
    () => {
        "fragment CommentFields on Comment { id body createdAt user { id name } }"
    };
}

macro_rules! project_fields {
    () => {
        "fragment ProjectFields on Project { \
            id name description state progress url startDate targetDate createdAt \
            lead { id name } \
            teams { nodes { id name } } \
        }"
    };
}

macro_rules! label_fields {
    () => {
        "fragment LabelFields on IssueLabel { id name color description team { id name } }"
    };
}

pub const VIEWER: &str = concat!("query Viewer { viewer { ...UserFields } } ", user_fields!());

pub const USERS: &str = concat!(
    "query Users($first: Int) { users(first: $first) { nodes { ...UserFields } } } ",
    user_fields!()
);

pub const USER: &str = concat!(
    "query User($id: String!) { user(id: $id) { ...UserFields } } ",
    user_fields!()
);

pub const TEAMS: &str = concat!(
    "query Teams($first: Int) { teams(first: $first) { nodes { ...TeamFields } } } ",
    team_fields!()
);

pub const TEAM: &str = concat!(
    "query Team($id: String!) { team(id: $id) { ...TeamFields \
        states { nodes { ...StateFields } } \
        members { nodes { id name } } } } ",
    team_fields!(),
    " ",
    state_fields!()
);

pub const WORKFLOW_STATES: &str = concat!(
    "query WorkflowStates($filter: WorkflowStateFilter) { \
        workflowStates(filter: $filter, first: 250) { nodes { ...StateFields } } } ",
    state_fields!()
);

pub const ISSUES: &str = concat!(
    "query Issues($filter: IssueFilter, $first: Int, $includeArchived: Boolean) { \
        issues(filter: $filter, first: $first, includeArchived: $includeArchived, orderBy: updatedAt) \
        { nodes { ...IssueFields } } } ",
    issue_fields!()
);

pub const ISSUE: &str = concat!(
    "query Issue($id: String!) { issue(id: $id) { ...IssueFields } } ",
    issue_fields!()
);

pub const SEARCH_ISSUES: &str = concat!(
    "query SearchIssues($term: String!, $first: Int) { \
        searchIssues(term: $term, first: $first) { nodes { ...IssueFields } } } ",
    issue_fields!()
);

pub const CREATE_ISSUE: &str = concat!(
    "mutation IssueCreate($input: IssueCreateInput!) { \
        issueCreate(input: $input) { success issue { ...IssueFields } } } ",
    issue_fields!()
);

pub const UPDATE_ISSUE: &str = concat!(
    "mutation IssueUpdate($id: String!, $input: IssueUpdateInput!) { \
        issueUpdate(id: $id, input: $input) { success issue { ...IssueFields } } } ",
    issue_fields!()
);

pub const COMMENTS: &str = concat!(
    "query IssueComments($id: String!) { issue(id: $id) { \
        comments(first: 100) { nodes { ...CommentFields } } } } ",
    comment_fields!()
);

pub const CREATE_COMMENT: &str = concat!(
    "mutation CommentCreate($input: CommentCreateInput!) { \
        commentCreate(input: $input) { success comment { ...CommentFields } } } ",
    comment_fields!()
);

pub const ATTACHMENTS: &str = "query IssueAttachments($id: String!) { issue(id: $id) { \
    attachments(first: 100) { nodes { id title subtitle url createdAt } } } }";

pub const PROJECTS: &str = concat!(
    "query Projects($first: Int) { projects(first: $first) { nodes { ...ProjectFields } } } ",
    project_fields!()
);

pub const PROJECT: &str = concat!(
    "query Project($id: String!) { project(id: $id) { ...ProjectFields } } ",
    project_fields!()
);

pub const PROJECT_MILESTONES: &str = "query ProjectMilestones($id: String!) { project(id: $id) { \
    projectMilestones(first: 100) { nodes { id name description targetDate sortOrder } } } }";

pub const LABELS: &str = concat!(
    "query Labels($filter: IssueLabelFilter) { \
        issueLabels(filter: $filter, first: 250) { nodes { ...LabelFields } } } ",
    label_fields!()
);

pub const CREATE_LABEL: &str = concat!(
    "mutation IssueLabelCreate($input: IssueLabelCreateInput!) { \
        issueLabelCreate(input: $input) { success issueLabel { ...LabelFields } } } ",
    label_fields!()
);

/// Top-level GraphQL response envelope
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,

    #[serde(default)]
    pub extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlErrorExtensions {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default, rename = "userPresentableMessage")]
    pub user_message: Option<String>,
}

impl GraphQlError {
    pub fn code(&self) -> Option<&str> {
        self.extensions.as_ref().and_then(|e| e.code.as_deref())
    }

    /// The most helpful message available
    pub fn display_message(&self) -> &str {
        self.extensions
            .as_ref()
            .and_then(|e| e.user_message.as_deref())
            .unwrap_or(&self.message)
    }
}

/// A paginated list
#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    pub nodes: Vec<T>,
}

impl<T> Connection<T> {
    pub fn into_vec<U: From<T>>(self) -> Vec<U> {
        self.nodes.into_iter().map(U::from).collect()
    }
}

/// Mutation payload, e.g. `issueCreate { success issue }`
#[derive(Debug, Deserialize)]
pub struct Payload<T> {
    pub success: bool,

    #[serde(alias = "issue", alias = "comment", alias = "issueLabel")]
    pub entity: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct GqlRef {
    pub id: String,

    #[serde(default)]
    pub name: String,
}

impl From<GqlRef> for Ref {
    fn from(r: GqlRef) -> Self {
        Ref::new(r.id, r.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct GqlName {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlUser {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub admin: bool,
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<GqlUser> for User {
    fn from(u: GqlUser) -> Self {
        User {
            id: u.id,
            name: u.name,
            display_name: u.display_name,
            email: u.email,
            active: u.active,
            admin: u.admin,
            avatar_url: u.avatar_url,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GqlState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub position: f64,
}

impl From<GqlState> for WorkflowState {
    fn from(s: GqlState) -> Self {
        WorkflowState {
            id: s.id,
            name: s.name,
            state_type: s.state_type,
            color: s.color,
            position: s.position,
        }
    }
}

impl From<GqlState> for StateRef {
    fn from(s: GqlState) -> Self {
        StateRef {
            id: s.id,
            name: s.name,
            state_type: s.state_type,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlTeam {
    pub id: String,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub states: Option<Connection<GqlState>>,
    pub members: Option<Connection<GqlRef>>,
}

impl From<GqlTeam> for Team {
    fn from(t: GqlTeam) -> Self {
        Team {
            id: t.id,
            key: t.key,
            name: t.name,
            description: t.description,
            private: t.private,
            created_at: t.created_at,
            states: t.states.map(Connection::into_vec).unwrap_or_default(),
            members: t.members.map(Connection::into_vec).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: f64,
    pub priority_label: Option<String>,
    pub estimate: Option<f64>,
    #[serde(default)]
    pub url: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub state: Option<GqlState>,
    pub assignee: Option<GqlRef>,
    pub team: Option<GqlRef>,
    pub project: Option<GqlRef>,
    pub labels: Option<Connection<GqlName>>,
}

impl From<GqlIssue> for Issue {
    fn from(i: GqlIssue) -> Self {
        // Linear reports priority as a float
        let priority = i.priority.clamp(0.0, 4.0) as u8;
        Issue {
            id: i.id,
            identifier: i.identifier,
            title: i.title,
            description: i.description,
            priority,
            priority_label: i
                .priority_label
                .unwrap_or_else(|| priority_label(priority).to_string()),
            estimate: i.estimate,
            url: i.url,
            state: i.state.map(StateRef::from),
            assignee: i.assignee.map(Ref::from),
            team: i.team.map(Ref::from),
            project: i.project.map(Ref::from),
            labels: i
                .labels
                .map(|c| c.nodes.into_iter().map(|l| l.name).collect())
                .unwrap_or_default(),
            due_date: i.due_date,
            created_at: i.created_at,
            updated_at: i.updated_at,
            completed_at: i.completed_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlComment {
    pub id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub user: Option<GqlRef>,
}

impl From<GqlComment> for Comment {
    fn from(c: GqlComment) -> Self {
        Comment {
            id: c.id,
            body: c.body,
            user: c.user.map(Ref::from),
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlAttachment {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<GqlAttachment> for Attachment {
    fn from(a: GqlAttachment) -> Self {
        Attachment {
            id: a.id,
            title: a.title,
            subtitle: a.subtitle,
            url: a.url,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlProject {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub url: String,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub lead: Option<GqlRef>,
    pub teams: Option<Connection<GqlRef>>,
}

impl From<GqlProject> for Project {
    fn from(p: GqlProject) -> Self {
        Project {
            id: p.id,
            name: p.name,
            description: p.description.filter(|d| !d.is_empty()),
            state: p.state,
            progress: p.progress,
            url: p.url,
            lead: p.lead.map(Ref::from),
            teams: p.teams.map(Connection::into_vec).unwrap_or_default(),
            start_date: p.start_date,
            target_date: p.target_date,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GqlMilestone {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub sort_order: f64,
}

impl From<GqlMilestone> for ProjectMilestone {
    fn from(m: GqlMilestone) -> Self {
        ProjectMilestone {
            id: m.id,
            name: m.name,
            description: m.description,
            target_date: m.target_date,
            sort_order: m.sort_order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GqlLabel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub description: Option<String>,
    pub team: Option<GqlRef>,
}

impl From<GqlLabel> for Label {
    fn from(l: GqlLabel) -> Self {
        Label {
            id: l.id,
            name: l.name,
            color: l.color,
            description: l.description,
            team: l.team.map(Ref::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_documents_include_fragments() {
        assert!(ISSUE.contains("...IssueFields"));
        assert!(ISSUE.contains("fragment IssueFields on Issue"));
        assert!(TEAM.contains("fragment StateFields on WorkflowState"));
        assert!(CREATE_LABEL.contains("fragment LabelFields on IssueLabel"));
    }

    #[test]
    fn test_issue_flattening() {
        let raw: GqlIssue = serde_json::from_value(json!({
            "id": "i1",
            "identifier": "ENG-7",
            "title": "Crash on start",
            "description": null,
            "priority": 1.0,
            "priorityLabel": "Urgent",
            "estimate": null,
            "url": "https://linear.app/acme/issue/ENG-7",
            "dueDate": "2024-06-01",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-02T10:00:00.000Z",
            "completedAt": null,
            "state": {"id": "s1", "name": "Todo", "type": "unstarted"},
            "assignee": {"id": "u1", "name": "Ada"},
            "team": {"id": "t1", "name": "Engineering"},
            "project": null,
            "labels": {"nodes": [{"name": "bug"}, {"name": "p0"}]}
        }))
        .unwrap();

        let issue = Issue::from(raw);
        assert_eq!(issue.priority, 1);
        assert_eq!(issue.labels, vec!["bug", "p0"]);
        assert_eq!(issue.state.unwrap().state_type, "unstarted");
        assert_eq!(issue.assignee, Some(Ref::new("u1", "Ada")));
        assert_eq!(issue.due_date, NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[test]
    fn test_team_connections_flatten() {
        let raw: GqlTeam = serde_json::from_value(json!({
            "id": "t1", "key": "ENG", "name": "Engineering",
            "description": null, "private": false, "createdAt": null,
            "states": {"nodes": [{"id": "s1", "name": "Todo", "type": "unstarted", "color": "#fff", "position": 1.0}]},
            "members": {"nodes": [{"id": "u1", "name": "Ada"}]}
        }))
        .unwrap();

        let team = Team::from(raw);
        assert_eq!(team.states.len(), 1);
        assert_eq!(team.members, vec![Ref::new("u1", "Ada")]);
    }

    #[test]
    fn test_payload_aliases() {
        let payload: Payload<GqlLabel> = serde_json::from_value(json!({
            "success": true,
            "issueLabel": {"id": "l1", "name": "bug", "color": "#f00", "description": null, "team": null}
        }))
        .unwrap();

        assert!(payload.success);
        assert_eq!(payload.entity.unwrap().name, "bug");
    }

    #[test]
    fn test_error_display_message() {
        let err: GraphQlError = serde_json::from_value(json!({
            "message": "Entity not found",
            "extensions": {"code": "INVALID_INPUT", "userPresentableMessage": "Could not find referenced Issue."}
        }))
        .unwrap();

        assert_eq!(err.code(), Some("INVALID_INPUT"));
        assert_eq!(err.display_message(), "Could not find referenced Issue.");
    }
}
