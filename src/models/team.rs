//! Teams and their workflow states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Ref;

/// A workflow state such as "Todo" or "In Progress"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    pub id: String,
    pub name: String,

    /// One of `triage`, `backlog`, `unstarted`, `started`, `completed`, `canceled`
    #[serde(rename = "type")]
    pub state_type: String,

    #[serde(default)]
    pub color: String,

    #[serde(default)]
    pub position: f64,
}

impl WorkflowState {
    pub fn new(id: impl Into<String>, name: impl Into<String>, state_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state_type: state_type.into(),
            color: String::new(),
            position: 0.0,
        }
    }

    /// Whether issues in this state are finished
    pub fn is_closed(&self) -> bool {
        matches!(self.state_type.as_str(), "completed" | "canceled")
    }
}

/// A Linear team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,

    /// Issue identifier prefix, e.g. `ENG`
    pub key: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub private: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Workflow states; only populated when fetching a single team
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<WorkflowState>,

    /// Members; only populated when fetching a single team
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Ref>,
}

impl Team {
    pub fn new(id: impl Into<String>, key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: name.into(),
            description: None,
            private: false,
            created_at: None,
            states: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Copy without the per-team detail lists
    pub fn summary(&self) -> Self {
        Self {
            states: Vec::new(),
            members: Vec::new(),
            ..self.clone()
        }
    }

    /// Find a workflow state by case-insensitive name
    pub fn state_named(&self, name: &str) -> Option<&WorkflowState> {
        self.states.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }
}
