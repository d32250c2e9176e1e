//! Issue tracker client abstraction.
//!
//! Capability handlers talk to Linear through the [`IssueTracker`] trait.
//! [`LinearClient`] implements it over Linear's GraphQL API and
//! [`MockTracker`] serves in-memory fixtures for tests and offline demos.
//!
//! Every method has a default implementation returning
//! [`TrackerError::NotImplemented`], so partial trackers only implement what
//! they support.

mod graphql;
mod linear;
pub mod mock;

pub use linear::{LinearClient, DEFAULT_API_URL};
pub use mock::MockTracker;

use async_trait::async_trait;

use crate::models::{
    Attachment, Comment, Issue, IssueDraft, IssueFilter, IssueUpdate, Label, LabelDraft, Project,
    ProjectMilestone, Team, User, WorkflowState,
};

/// Access to issue-tracker entities
#[async_trait]
pub trait IssueTracker: Send + Sync + std::fmt::Debug {
    /// Human-readable name of the backend
    fn name(&self) -> &str;

    // ========== USERS ==========

    /// The user the API key belongs to
    async fn viewer(&self) -> Result<User, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn list_users(&self, _limit: u32) -> Result<Vec<User>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn get_user(&self, _id: &str) -> Result<User, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    // ========== TEAMS ==========

    async fn list_teams(&self, _limit: u32) -> Result<Vec<Team>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    /// Get a team with its workflow states and members
    async fn get_team(&self, _id: &str) -> Result<Team, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    /// Workflow states, optionally restricted to one team
    async fn list_workflow_states(
        &self,
        _team_id: Option<&str>,
    ) -> Result<Vec<WorkflowState>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    // ========== ISSUES ==========

    async fn list_issues(&self, _filter: &IssueFilter) -> Result<Vec<Issue>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    /// Get an issue by ID or identifier (`ENG-123`)
    async fn get_issue(&self, _id: &str) -> Result<Issue, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    /// Full-text search over issues
    async fn search_issues(&self, _query: &str, _limit: u32) -> Result<Vec<Issue>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn create_issue(&self, _draft: &IssueDraft) -> Result<Issue, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn update_issue(&self, _id: &str, _update: &IssueUpdate) -> Result<Issue, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    // ========== COMMENTS & ATTACHMENTS ==========

    async fn list_comments(&self, _issue_id: &str) -> Result<Vec<Comment>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn add_comment(&self, _issue_id: &str, _body: &str) -> Result<Comment, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn list_attachments(&self, _issue_id: &str) -> Result<Vec<Attachment>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    // ========== PROJECTS ==========

    async fn list_projects(&self, _limit: u32) -> Result<Vec<Project>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn get_project(&self, _id: &str) -> Result<Project, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn list_project_milestones(
        &self,
        _project_id: &str,
    ) -> Result<Vec<ProjectMilestone>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    // ========== LABELS ==========

    /// Labels, optionally restricted to one team
    async fn list_labels(&self, _team_id: Option<&str>) -> Result<Vec<Label>, TrackerError> {
        Err(TrackerError::NotImplemented)
    }

    async fn create_label(&self, _draft: &LabelDraft) -> Result<Label, TrackerError> {
        Err(TrackerError::NotImplemented)
    }
}

/// Errors that can occur when talking to the issue tracker
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// The requested operation is not supported by this tracker
    #[error("Operation not implemented for this tracker")]
    NotImplemented,

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Response could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded, with the server's suggested wait in seconds
    #[error("Rate limit exceeded")]
    RateLimit(Option<u64>),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or rejected API key
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Unexpected HTTP status from the API
    #[error("API error: {0}")]
    Api(String),

    /// Errors reported in a GraphQL response
    #[error("GraphQL error: {0}")]
    GraphQl(String),
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Parse(format!("JSON: {}", err))
    }
}
