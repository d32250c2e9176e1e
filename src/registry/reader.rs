//! Resource reading: resolve a URI, invoke its handler, validate the payload.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use super::content::ResourceContent;
use super::error::panic_message;
use super::resource::{ResourceHandler, ResourceRegistry};
use super::tool::Arguments;

/// Errors surfaced by [`read_resource`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceReadError {
    /// No literal resource or template matches the URI
    #[error("Resource not found: {uri}")]
    NotFound { uri: String },

    /// The handler reported a failure (or returned one)
    #[error("{0}")]
    Reported(String),

    /// The handler returned a payload with neither text nor blob
    #[error("Invalid resource content: missing both text and blob for {uri}")]
    MissingContent { uri: String },

    /// The handler failed without a usable message
    #[error("Unknown error reading resource: {uri}")]
    Unknown { uri: String },
}

impl ResourceReadError {
    /// Whether this error means the URI was not registered
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResourceReadError::NotFound { .. })
    }
}

/// Read the resource at `uri`.
///
/// Looks up a literal registration first, then the most specific matching
/// template. Template variables are merged into `args` without overriding
/// caller-supplied values. The handler is invoked exactly once; a returned
/// error or a panic is converted into a [`ResourceReadError`].
pub async fn read_resource(
    registry: &ResourceRegistry,
    uri: &str,
    args: Option<Arguments>,
) -> Result<ResourceContent, ResourceReadError> {
    let mut args = args.unwrap_or_default();

    let handler: Arc<dyn ResourceHandler> = match registry.handler(uri) {
        Some(handler) => handler,
        None => match registry.match_template(uri) {
            Some(matched) => {
                tracing::debug!(uri = %uri, template = %matched.template, "Resolved resource via template");
                for (name, value) in matched.variables {
                    args.entry(name).or_insert(value);
                }
                matched.handler
            }
            None => {
                tracing::debug!(uri = %uri, "Resource not found");
                return Err(ResourceReadError::NotFound {
                    uri: uri.to_string(),
                });
            }
        },
    };

    let outcome = AssertUnwindSafe(handler.read(args)).catch_unwind().await;

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::warn!(uri = %uri, error = %e, "Resource handler failed");
            return Err(match e.reported_message() {
                Some(message) => ResourceReadError::Reported(message),
                None => ResourceReadError::Unknown {
                    uri: uri.to_string(),
                },
            });
        }
        Err(payload) => {
            tracing::error!(uri = %uri, "Resource handler panicked");
            return Err(match panic_message(&*payload) {
                Some(message) => ResourceReadError::Reported(message),
                None => ResourceReadError::Unknown {
                    uri: uri.to_string(),
                },
            });
        }
    };

    if result.is_error {
        let message = result
            .error_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Failed to read resource: {}", uri));
        return Err(ResourceReadError::Reported(message));
    }

    result
        .data
        .and_then(|payload| ResourceContent::from_payload(payload, uri))
        .ok_or_else(|| ResourceReadError::MissingContent {
            uri: uri.to_string(),
        })
}
