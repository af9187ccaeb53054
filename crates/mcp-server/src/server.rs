//! Main MCP server orchestration

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::protocol::{RequestHandler, ServerInfo};
use crate::tools::ToolRegistry;
use crate::transport::{SseTransport, StdioTransport, TransportError};

/// Server mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerMode {
    /// stdio transport
    #[default]
    Stdio,
    /// HTTP/SSE transport
    Sse { addr: SocketAddr },
}

/// MCP server
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    server_info: ServerInfo,
    instructions: Option<String>,
    mode: ServerMode,
}

impl McpServer {
    /// Create a new MCP server serving the given tools
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        registry: ToolRegistry,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            server_info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            instructions: None,
            mode: ServerMode::default(),
        }
    }

    /// Usage instructions sent to clients on initialize
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the server mode
    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn request_handler(&self) -> RequestHandler {
        let handler = RequestHandler::new(self.registry.clone(), self.server_info.clone());
        match &self.instructions {
            Some(instructions) => handler.with_instructions(instructions.clone()),
            None => handler,
        }
    }

    /// Run the server until the transport shuts down
    pub async fn run(&self) -> Result<(), TransportError> {
        let handler = Arc::new(self.request_handler());

        info!(
            "{} v{} serving {} tools",
            self.server_info.name,
            self.server_info.version,
            self.registry.len()
        );

        match self.mode {
            ServerMode::Stdio => StdioTransport::new(handler).run().await,
            ServerMode::Sse { addr } => SseTransport::new(handler, addr).run().await,
        }
    }
}
