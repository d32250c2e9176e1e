//! Issue labels.

use serde::{Deserialize, Serialize};

use super::Ref;

/// An issue label; workspace-wide when `team` is absent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub name: String,

    /// Hex color, e.g. `#bb87fc`
    #[serde(default)]
    pub color: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Ref>,
}

/// Input for creating a label; serializes as Linear's `IssueLabelCreateInput`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDraft {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_serialization() {
        let draft = LabelDraft {
            name: "bug".into(),
            team_id: Some("t1".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            serde_json::json!({"name": "bug", "teamId": "t1"})
        );
    }
}
