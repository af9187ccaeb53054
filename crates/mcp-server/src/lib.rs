//! # mcp-server
//!
//! MCP (Model Context Protocol) server runtime: JSON-RPC message types, a
//! request handler, the tool registry and the stdio and HTTP/SSE transports.

pub mod protocol;
mod server;
pub mod tools;
pub mod transport;

pub use protocol::{McpError, McpInputSchema, McpMessage, McpTool, ServerCapabilities};
pub use server::{McpServer, ServerMode};
pub use tools::{RegistryError, ToolError, ToolHandler, ToolRegistry};
pub use transport::{SseTransport, StdioTransport, TransportError};
