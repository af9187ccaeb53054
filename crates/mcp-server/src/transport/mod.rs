//! Transport implementations for MCP server

mod sse;
mod stdio;

pub use sse::SseTransport;
pub use stdio::StdioTransport;

use thiserror::Error;

/// Errors that stop a transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
