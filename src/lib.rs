//! # Linear MCP
//!
//! A Model Context Protocol (MCP) server that exposes a Linear workspace
//! (teams, issues, projects, labels and users) to AI assistants.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`registry`]: Capability registry for tools, prompts and resources, plus resource reading
//! - [`mcp`]: Protocol dispatch and the rmcp-based stdio / streamable HTTP server
//! - [`capabilities`]: The Linear tools, resources and prompts
//! - [`tracker`]: Issue tracker abstraction with the Linear GraphQL client and an in-memory mock
//! - [`models`]: Core data structures (Issue, Team, Project, ...)
//! - [`utils`]: HTTP client and retry utilities
//! - [`config`]: Configuration management

pub mod capabilities;
pub mod config;
pub mod mcp;
pub mod models;
pub mod registry;
pub mod tracker;
pub mod utils;

// Re-export commonly used types
pub use mcp::{Dispatcher, McpServer};
pub use registry::CapabilityRegistry;
pub use tracker::{IssueTracker, LinearClient, MockTracker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
