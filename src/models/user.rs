//! Workspace users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Linear workspace member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Full name
    pub name: String,

    /// Short name shown in the Linear UI
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub admin: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create an active, non-admin user
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        let display_name = name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        Self {
            id: id.into(),
            name,
            display_name,
            email: None,
            active: true,
            admin: false,
            avatar_url: None,
            created_at: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
