//! Flat data models for Linear entities.
//!
//! These are the shapes returned to MCP clients. The tracker client converts
//! Linear's nested GraphQL objects into them.

mod issue;
mod label;
mod project;
mod team;
mod user;

use serde::{Deserialize, Serialize};

pub use issue::{
    priority_label, Attachment, Comment, Issue, IssueDraft, IssueFilter, IssueUpdate, StateRef,
};
pub use label::{Label, LabelDraft};
pub use project::{Project, ProjectMilestone};
pub use team::{Team, WorkflowState};
pub use user::User;

/// Reference to a related entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    pub id: String,
    pub name: String,
}

impl Ref {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
