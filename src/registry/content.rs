//! Content shapes returned by capability handlers.

use serde::{Deserialize, Serialize};

/// A single content block in a tool result or prompt message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text
    Text { text: String },
}

impl Content {
    /// Create a text content block
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    /// The text of this block, if it is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text { text } => Some(text),
        }
    }
}

/// Payload returned by a resource handler, before validation.
///
/// Handlers may leave `uri` unset; the resource reader fills it with the
/// requested URI. At least one of `text` or `blob` must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Base64-encoded binary content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob: Option<String>,
}

impl ResourcePayload {
    /// Create a text payload
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Create a binary payload from base64-encoded data
    pub fn blob(base64: impl Into<String>) -> Self {
        Self {
            blob: Some(base64.into()),
            ..Default::default()
        }
    }

    /// Create a pretty-printed JSON text payload
    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::text(serde_json::to_string_pretty(value)?).with_mime_type("application/json"))
    }

    /// Set the URI
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Body of a validated resource envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceBody {
    Text { text: String },
    Blob { blob: String },
}

/// Validated resource content envelope, as sent to the protocol boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(flatten)]
    pub body: ResourceBody,
}

impl ResourceContent {
    /// Validate a handler payload, filling a missing URI with `requested_uri`.
    ///
    /// Returns `None` when the payload has neither text nor blob. Text takes
    /// precedence when both are present.
    pub fn from_payload(payload: ResourcePayload, requested_uri: &str) -> Option<Self> {
        let body = match (payload.text, payload.blob) {
            (Some(text), _) => ResourceBody::Text { text },
            (None, Some(blob)) => ResourceBody::Blob { blob },
            (None, None) => return None,
        };

        Some(Self {
            uri: payload.uri.unwrap_or_else(|| requested_uri.to_string()),
            mime_type: payload.mime_type,
            body,
        })
    }

    /// The text body, if any
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResourceBody::Text { text } => Some(text),
            ResourceBody::Blob { .. } => None,
        }
    }

    /// The base64 blob body, if any
    pub fn blob(&self) -> Option<&str> {
        match &self.body {
            ResourceBody::Blob { blob } => Some(blob),
            ResourceBody::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_serialization() {
        let value = serde_json::to_value(Content::text("hi")).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hi"}));
    }

    #[test]
    fn test_from_payload_backfills_uri() {
        let content =
            ResourceContent::from_payload(ResourcePayload::text("hello"), "thing:///1").unwrap();
        assert_eq!(content.uri, "thing:///1");
        assert_eq!(content.text(), Some("hello"));
    }

    #[test]
    fn test_from_payload_keeps_handler_uri() {
        let payload = ResourcePayload::text("x").with_uri("thing:///canonical");
        let content = ResourceContent::from_payload(payload, "thing:///alias").unwrap();
        assert_eq!(content.uri, "thing:///canonical");
    }

    #[test]
    fn test_from_payload_rejects_empty() {
        assert!(ResourceContent::from_payload(ResourcePayload::default(), "thing:///1").is_none());
    }

    #[test]
    fn test_text_wins_over_blob() {
        let payload = ResourcePayload {
            text: Some("t".into()),
            blob: Some("YmxvYg==".into()),
            ..Default::default()
        };
        let content = ResourceContent::from_payload(payload, "u").unwrap();
        assert_eq!(content.text(), Some("t"));
        assert!(content.blob().is_none());
    }

    #[test]
    fn test_envelope_serialization() {
        let content = ResourceContent::from_payload(
            ResourcePayload::blob("AAEC").with_mime_type("application/octet-stream"),
            "file:///bin",
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            json!({"uri": "file:///bin", "mimeType": "application/octet-stream", "blob": "AAEC"})
        );
    }
}
