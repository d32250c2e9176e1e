//! Resource descriptors and handlers.
//!
//! Literal resources and URI-template resources share one registry; the
//! [`ResourceKey`] variant decides which listing a descriptor appears in.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::content::ResourcePayload;
use super::error::HandlerError;
use super::store::{Keyed, Registry};
use super::template::UriTemplate;
use super::tool::Arguments;

/// Registration key of a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKey {
    /// A concrete URI
    #[serde(rename = "uri")]
    Uri(String),

    /// A parameterized URI pattern
    #[serde(rename = "uriTemplate")]
    Template(String),
}

impl ResourceKey {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceKey::Uri(s) | ResourceKey::Template(s) => s,
        }
    }
}

/// An MCP resource or resource template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    #[serde(flatten)]
    pub key: ResourceKey,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ResourceDescriptor {
    /// Describe a resource at a literal URI
    pub fn uri(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: ResourceKey::Uri(uri.into()),
            name: name.into(),
            description: None,
            mime_type: None,
        }
    }

    /// Describe a family of resources addressed by a URI template
    pub fn template(uri_template: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: ResourceKey::Template(uri_template.into()),
            name: name.into(),
            description: None,
            mime_type: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Whether this descriptor is keyed by a URI template
    pub fn is_template(&self) -> bool {
        matches!(self.key, ResourceKey::Template(_))
    }

    /// The literal URI, if this is not a template
    pub fn literal_uri(&self) -> Option<&str> {
        match &self.key {
            ResourceKey::Uri(uri) => Some(uri),
            ResourceKey::Template(_) => None,
        }
    }

    /// The URI template, if this is a template
    pub fn uri_template(&self) -> Option<&str> {
        match &self.key {
            ResourceKey::Template(template) => Some(template),
            ResourceKey::Uri(_) => None,
        }
    }
}

impl Keyed for ResourceDescriptor {
    const KIND: &'static str = "resource";
    const KEY_FIELD: &'static str = "uri or uriTemplate";

    fn key(&self) -> &str {
        self.key.as_str()
    }
}

/// Result returned by a resource handler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceResult {
    /// Candidate content envelope
    pub data: Option<ResourcePayload>,

    /// Set when the handler reports its own failure
    pub is_error: bool,

    /// Optional message accompanying `is_error`
    pub error_message: Option<String>,
}

impl ResourceResult {
    /// Successful result carrying `payload`
    pub fn ok(payload: ResourcePayload) -> Self {
        Self {
            data: Some(payload),
            is_error: false,
            error_message: None,
        }
    }

    /// Handler-reported failure
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            is_error: true,
            error_message: Some(message.into()),
        }
    }
}

/// Handler for reading a resource
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Read the resource. `args` holds caller arguments and, for templates,
    /// the variables extracted from the requested URI.
    async fn read(&self, args: Arguments) -> Result<ResourceResult, HandlerError>;
}

/// Adapter turning an async closure into a [`ResourceHandler`]
pub struct FnResource<F>(F);

#[async_trait]
impl<F, Fut> ResourceHandler for FnResource<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ResourceResult, HandlerError>> + Send + 'static,
{
    async fn read(&self, args: Arguments) -> Result<ResourceResult, HandlerError> {
        (self.0)(args).await
    }
}

/// Wrap an async closure as a resource handler
pub fn resource_fn<F, Fut>(f: F) -> Arc<dyn ResourceHandler>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ResourceResult, HandlerError>> + Send + 'static,
{
    Arc::new(FnResource(f))
}

/// Registry for all MCP resources and resource templates
pub type ResourceRegistry = Registry<ResourceDescriptor, dyn ResourceHandler>;

/// A template registration that matched a concrete URI
pub(crate) struct TemplateMatch {
    pub template: String,
    pub variables: Arguments,
    pub handler: Arc<dyn ResourceHandler>,
}

impl ResourceRegistry {
    /// Find the most specific registered template matching `uri`.
    ///
    /// Templates with more literal characters win; ties go to the first key in
    /// sorted order.
    pub(crate) fn match_template(&self, uri: &str) -> Option<TemplateMatch> {
        let mut best: Option<(usize, TemplateMatch)> = None;

        for (descriptor, handler) in self.entries_where(ResourceDescriptor::is_template) {
            let template = match UriTemplate::parse(descriptor.key.as_str()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Skipping unparseable resource template: {}", e);
                    continue;
                }
            };

            if let Some(variables) = template.match_uri(uri) {
                let score = template.literal_len();
                if best.as_ref().map_or(true, |(s, _)| score > *s) {
                    best = Some((
                        score,
                        TemplateMatch {
                            template: template.as_str().to_string(),
                            variables,
                            handler,
                        },
                    ));
                }
            }
        }

        best.map(|(_, m)| m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop() -> Arc<dyn ResourceHandler> {
        resource_fn(|_args| async { Ok(ResourceResult::ok(ResourcePayload::text("x"))) })
    }

    #[test]
    fn test_descriptor_serialization() {
        let literal = ResourceDescriptor::uri("linear://teams", "Teams")
            .with_mime_type("application/json");
        assert_eq!(
            serde_json::to_value(&literal).unwrap(),
            json!({"uri": "linear://teams", "name": "Teams", "mimeType": "application/json"})
        );

        let template = ResourceDescriptor::template("linear://issues/{issueId}", "Issue");
        assert_eq!(
            serde_json::to_value(&template).unwrap(),
            json!({"uriTemplate": "linear://issues/{issueId}", "name": "Issue"})
        );
    }

    #[test]
    fn test_key_accessors() {
        let literal = ResourceDescriptor::uri("a://b", "b");
        assert!(!literal.is_template());
        assert_eq!(literal.literal_uri(), Some("a://b"));
        assert_eq!(literal.uri_template(), None);

        let template = ResourceDescriptor::template("a://{b}", "b");
        assert!(template.is_template());
        assert_eq!(template.uri_template(), Some("a://{b}"));
        assert_eq!(template.literal_uri(), None);
    }

    #[test]
    fn test_match_template_prefers_specific() {
        let registry = ResourceRegistry::new();
        registry
            .register(ResourceDescriptor::template("linear://{kind}/{id}", "generic"), noop())
            .unwrap();
        registry
            .register(ResourceDescriptor::template("linear://teams/{teamId}", "team"), noop())
            .unwrap();

        let matched = registry.match_template("linear://teams/ENG").unwrap();
        assert_eq!(matched.template, "linear://teams/{teamId}");
        assert_eq!(matched.variables.get("teamId"), Some(&json!("ENG")));

        let matched = registry.match_template("linear://projects/p1").unwrap();
        assert_eq!(matched.template, "linear://{kind}/{id}");
    }

    #[test]
    fn test_match_template_ignores_literals() {
        let registry = ResourceRegistry::new();
        registry
            .register(ResourceDescriptor::uri("linear://teams", "teams"), noop())
            .unwrap();
        assert!(registry.match_template("linear://teams").is_none());
    }
}
