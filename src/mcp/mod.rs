//! MCP (Model Context Protocol) implementation.

mod dispatch;
pub mod server;

pub use dispatch::{
    DispatchError, Dispatcher, GetPromptResponse, ListPromptsResponse,
    ListResourceTemplatesResponse, ListResourcesResponse, ListToolsResponse, ReadResourceResponse,
};
pub use server::{McpServer, ServerError};
