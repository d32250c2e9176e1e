//! Issues, comments and attachments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Ref;

/// Human-readable name of a Linear priority value
pub fn priority_label(priority: u8) -> &'static str {
    match priority {
        1 => "Urgent",
        2 => "High",
        3 => "Medium",
        4 => "Low",
        _ => "No priority",
    }
}

/// Workflow state of an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRef {
    pub id: String,
    pub name: String,

    #[serde(rename = "type")]
    pub state_type: String,
}

/// A Linear issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,

    /// Team-scoped identifier, e.g. `ENG-123`
    pub identifier: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 0 = none, 1 = urgent, 2 = high, 3 = medium, 4 = low
    #[serde(default)]
    pub priority: u8,

    #[serde(default)]
    pub priority_label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,

    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Ref>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Ref>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Ref>,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// One-line summary, e.g. `ENG-1 [In Progress] Fix login (High)`
    pub fn headline(&self) -> String {
        let state = self
            .state
            .as_ref()
            .map(|s| format!(" [{}]", s.name))
            .unwrap_or_default();
        format!(
            "{}{} {} ({})",
            self.identifier,
            state,
            self.title,
            priority_label(self.priority)
        )
    }
}

/// Filter for listing issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    pub team_id: Option<String>,
    pub assignee_id: Option<String>,

    /// Workflow state name (case-insensitive)
    pub state: Option<String>,

    pub project_id: Option<String>,

    /// Label name
    pub label: Option<String>,

    pub include_archived: bool,

    /// Maximum number of issues to return
    pub limit: u32,
}

impl Default for IssueFilter {
    fn default() -> Self {
        Self {
            team_id: None,
            assignee_id: None,
            state: None,
            project_id: None,
            label: None,
            include_archived: false,
            limit: 50,
        }
    }
}

impl IssueFilter {
    /// Issues belonging to one team
    pub fn for_team(team_id: impl Into<String>) -> Self {
        Self {
            team_id: Some(team_id.into()),
            ..Default::default()
        }
    }
}

/// Input for creating an issue; serializes as Linear's `IssueCreateInput`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
    pub team_id: String,
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
}

/// Partial update of an issue; serializes as Linear's `IssueUpdateInput`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
}

impl IssueUpdate {
    /// Whether the update would change nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A comment on an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,

    /// Markdown body
    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Ref>,

    pub created_at: DateTime<Utc>,
}

/// A link attached to an issue (pull request, document, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_labels() {
        assert_eq!(priority_label(0), "No priority");
        assert_eq!(priority_label(1), "Urgent");
        assert_eq!(priority_label(4), "Low");
        assert_eq!(priority_label(9), "No priority");
    }

    #[test]
    fn test_draft_serializes_as_create_input() {
        let draft = IssueDraft {
            team_id: "t1".into(),
            title: "Fix login".into(),
            priority: Some(2),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            serde_json::json!({"teamId": "t1", "title": "Fix login", "priority": 2})
        );
    }

    #[test]
    fn test_update_is_empty() {
        assert!(IssueUpdate::default().is_empty());

        let update = IssueUpdate {
            state_id: Some("s1".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"stateId": "s1"})
        );
    }

    #[test]
    fn test_headline() {
        let issue = Issue {
            id: "i1".into(),
            identifier: "ENG-1".into(),
            title: "Fix login".into(),
            description: None,
            priority: 2,
            priority_label: "High".into(),
            estimate: None,
            url: String::new(),
            state: Some(StateRef {
                id: "s1".into(),
                name: "In Progress".into(),
                state_type: "started".into(),
            }),
            assignee: None,
            team: None,
            project: None,
            labels: Vec::new(),
            due_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        };

        assert_eq!(issue.headline(), "ENG-1 [In Progress] Fix login (High)");
    }
}
