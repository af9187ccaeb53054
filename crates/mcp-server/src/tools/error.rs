//! Tool error types

use thiserror::Error;

/// Errors raised while registering tools
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Invalid tool name: {0}")]
    InvalidName(String),
}

/// Errors returned by tool invocations
///
/// Every variant is reported back to the client as a tool result with
/// `isError` set; none of them abort the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// Arguments did not match the declared input shape
    #[error("Parameter validation failed:\n{0}")]
    Validation(String),

    /// A validator denied the call; the reason is surfaced verbatim
    #[error("{0}")]
    Authorization(String),

    /// The remote operation failed
    #[error("{0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
