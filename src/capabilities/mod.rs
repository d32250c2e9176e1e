//! Linear tools, resources and prompts.
//!
//! [`register_all`] populates a [`CapabilityRegistry`] with everything the
//! server exposes, backed by one shared [`IssueTracker`].

pub mod args;
mod issues;
mod labels;
mod projects;
mod prompts;
mod resources;
mod teams;
mod users;

use std::sync::Arc;

use async_trait::async_trait;

use crate::registry::{
    Arguments, CapabilityRegistry, HandlerError, RegistrationError, ResourceHandler,
    ResourceResult, ToolHandler, ToolResult,
};
use crate::tracker::IssueTracker;

/// MIME type of every resource payload
pub const JSON_MIME: &str = "application/json";

/// Register every Linear tool, resource and prompt
pub fn register_all(
    registry: &CapabilityRegistry,
    tracker: Arc<dyn IssueTracker>,
) -> Result<(), RegistrationError> {
    users::register(registry, &tracker)?;
    teams::register(registry, &tracker)?;
    issues::register(registry, &tracker)?;
    projects::register(registry, &tracker)?;
    labels::register(registry, &tracker)?;
    resources::register(registry, &tracker)?;
    prompts::register(registry)?;

    tracing::info!(
        tracker = tracker.name(),
        tools = registry.get_all_tools().len(),
        resources = registry.get_all_resources().len(),
        templates = registry.get_resource_templates().len(),
        prompts = registry.get_all_prompts().len(),
        "Registered capabilities"
    );
    Ok(())
}

/// Turns tracker failures into in-band `isError` tool results
struct TrackerTool<H>(H);

#[async_trait]
impl<H: ToolHandler> ToolHandler for TrackerTool<H> {
    async fn call(&self, args: Arguments) -> Result<ToolResult, HandlerError> {
        match self.0.call(args).await {
            Err(HandlerError::Tracker(e)) => {
                tracing::warn!("Linear request failed: {}", e);
                Ok(ToolResult::error(format!("Linear request failed: {}", e)))
            }
            other => other,
        }
    }
}

pub(crate) fn tracker_tool(handler: impl ToolHandler + 'static) -> Arc<dyn ToolHandler> {
    Arc::new(TrackerTool(handler))
}

/// Turns tracker failures into handler-reported resource errors
struct TrackerResource<H>(H);

#[async_trait]
impl<H: ResourceHandler> ResourceHandler for TrackerResource<H> {
    async fn read(&self, args: Arguments) -> Result<ResourceResult, HandlerError> {
        match self.0.read(args).await {
            Err(HandlerError::Tracker(e)) => {
                tracing::warn!("Linear request failed: {}", e);
                Ok(ResourceResult::error(e.to_string()))
            }
            other => other,
        }
    }
}

pub(crate) fn tracker_resource(
    handler: impl ResourceHandler + 'static,
) -> Arc<dyn ResourceHandler> {
    Arc::new(TrackerResource(handler))
}
