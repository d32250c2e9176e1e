//! MCP server implementation using rmcp.
//!
//! [`McpServer`] adapts the [`Dispatcher`] to rmcp's `ServerHandler` and runs
//! it over stdio or streamable HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use rmcp::model::{
    AnnotateAble, CallToolRequestParams, CallToolResult, Content, GetPromptRequestParams,
    GetPromptResult, Implementation, ListPromptsResult, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, PaginatedRequestParams, Prompt, PromptArgument,
    PromptMessage, PromptMessageRole, RawResource, RawResourceTemplate, ReadResourceRequestParams,
    ReadResourceResult, Resource, ResourceContents, ResourceTemplate, ServerCapabilities,
    ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::dispatch::Dispatcher;
use crate::registry::{
    CapabilityRegistry, PromptArguments, PromptDescriptor, ResourceBody, ResourceContent,
    ResourceDescriptor, Role, ToolDescriptor,
};

/// Errors that can occur while running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialize MCP session: {0}")]
    Initialize(String),

    #[error("MCP session ended with error: {0}")]
    Session(String),
}

/// The MCP server for Linear
#[derive(Debug, Clone)]
pub struct McpServer {
    dispatcher: Dispatcher,
    name: String,
}

impl McpServer {
    /// Create a new MCP server over a populated registry
    pub fn new(registry: Arc<CapabilityRegistry>, name: impl Into<String>) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            name: name.into(),
        }
    }

    /// The dispatcher backing this server
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run the server in stdio mode (for Claude Desktop and other MCP clients)
    pub async fn run_stdio(self) -> Result<(), ServerError> {
        tracing::info!("Starting MCP server in stdio mode");

        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| ServerError::Initialize(e.to_string()))?;

        tracing::info!("MCP server initialized");

        service
            .waiting()
            .await
            .map_err(|e| ServerError::Session(e.to_string()))?;

        tracing::info!("MCP client disconnected");
        Ok(())
    }

    /// Run the server in streamable HTTP mode, serving MCP at `/mcp`.
    ///
    /// Returns once `shutdown` is cancelled and in-flight requests drain.
    pub async fn run_http(
        self,
        addr: SocketAddr,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Starting MCP server in HTTP mode on http://{}/mcp", local_addr);

        let app = axum::Router::new().nest_service("/mcp", self.into_http_service(shutdown.clone()));

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Build the streamable HTTP service; each session gets a clone of this server
    pub fn into_http_service(
        self,
        cancellation_token: CancellationToken,
    ) -> StreamableHttpService<McpServer> {
        let factory = move || -> Result<McpServer, std::io::Error> { Ok(self.clone()) };

        let config = StreamableHttpServerConfig {
            sse_keep_alive: None,
            sse_retry: None,
            stateful_mode: true,
            cancellation_token,
        };

        StreamableHttpService::new(factory, LocalSessionManager::default().into(), config)
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = self.name.clone();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_prompts()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info,
            instructions: Some(
                "Linear MCP server - browse and manage Linear issues, teams, projects and labels"
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self
            .dispatcher
            .list_tools()
            .tools
            .into_iter()
            .map(to_rmcp_tool)
            .collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let result = self
            .dispatcher
            .call_tool(&request.name, request.arguments)
            .await;

        let content = result
            .content
            .iter()
            .filter_map(|c| c.as_text())
            .map(Content::text)
            .collect();

        Ok(if result.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        let prompts = self
            .dispatcher
            .list_prompts()
            .prompts
            .into_iter()
            .map(to_rmcp_prompt)
            .collect();
        Ok(ListPromptsResult::with_all_items(prompts))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let args = request.arguments.map(prompt_arguments);
        let response = self.dispatcher.get_prompt(&request.name, args);

        if response.is_error {
            return Err(McpError::invalid_params(
                response.error_message.unwrap_or_default(),
                None,
            ));
        }

        let messages = response
            .messages
            .into_iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => PromptMessageRole::User,
                    Role::Assistant => PromptMessageRole::Assistant,
                };
                PromptMessage::new_text(role, m.content.as_text().unwrap_or_default())
            })
            .collect();

        Ok(GetPromptResult {
            description: response.description,
            messages,
        })
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self
            .dispatcher
            .list_resources()
            .resources
            .into_iter()
            .filter_map(to_rmcp_resource)
            .collect();
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let templates = self
            .dispatcher
            .list_resource_templates()
            .resource_templates
            .into_iter()
            .filter_map(to_rmcp_template)
            .collect();
        Ok(ListResourceTemplatesResult::with_all_items(templates))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let response = self.dispatcher.read_resource(&request.uri, None).await;

        if response.is_error {
            let message = response.error_message.unwrap_or_default();
            return Err(if response.not_found {
                McpError::resource_not_found(message, None)
            } else {
                McpError::internal_error(message, None)
            });
        }

        Ok(ReadResourceResult {
            contents: response.contents.into_iter().map(to_rmcp_contents).collect(),
        })
    }
}

fn to_rmcp_tool(descriptor: ToolDescriptor) -> Tool {
    let schema = match descriptor.input_schema {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    let mut tool = Tool::new(descriptor.name, String::new(), Arc::new(schema));
    tool.description = descriptor.description.map(Into::into);
    tool
}

fn to_rmcp_prompt(descriptor: PromptDescriptor) -> Prompt {
    let arguments = descriptor
        .arguments
        .into_iter()
        .map(|a| PromptArgument {
            name: a.name,
            title: None,
            description: a.description,
            required: Some(a.required),
        })
        .collect::<Vec<_>>();

    Prompt::new(
        descriptor.name,
        descriptor.description,
        (!arguments.is_empty()).then_some(arguments),
    )
}

fn to_rmcp_resource(descriptor: ResourceDescriptor) -> Option<Resource> {
    let mut raw = RawResource::new(descriptor.literal_uri()?, descriptor.name.clone());
    raw.description = descriptor.description;
    raw.mime_type = descriptor.mime_type;
    Some(raw.no_annotation())
}

fn to_rmcp_template(descriptor: ResourceDescriptor) -> Option<ResourceTemplate> {
    let raw = RawResourceTemplate {
        uri_template: descriptor.uri_template()?.to_string(),
        name: descriptor.name,
        title: None,
        description: descriptor.description,
        mime_type: descriptor.mime_type,
        icons: None,
    };
    Some(raw.no_annotation())
}

fn to_rmcp_contents(content: ResourceContent) -> ResourceContents {
    match content.body {
        ResourceBody::Text { text } => ResourceContents::TextResourceContents {
            uri: content.uri,
            mime_type: content.mime_type,
            text,
            meta: None,
        },
        ResourceBody::Blob { blob } => ResourceContents::BlobResourceContents {
            uri: content.uri,
            mime_type: content.mime_type,
            blob,
            meta: None,
        },
    }
}

/// MCP prompt arguments are strings; stringify anything else
fn prompt_arguments(args: serde_json::Map<String, Value>) -> PromptArguments {
    args.into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (k, v)
        })
        .collect()
}
