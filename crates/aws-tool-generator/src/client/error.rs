//! AWS client errors

use thiserror::Error;

/// Errors raised while calling an AWS operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Unable to locate credentials: {0}")]
    Credentials(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),

    #[error("Invalid endpoint URL {url}: {message}")]
    Endpoint { url: String, message: String },

    #[error("Could not connect to the endpoint URL {url}: {message}")]
    Http { url: String, message: String },

    /// Error response returned by the service
    #[error("An error occurred ({code}) when calling the {operation} operation: {message}")]
    Service {
        operation: String,
        code: String,
        message: String,
        status: u16,
    },

    #[error("Unable to parse the {operation} response: {message}")]
    Decode { operation: String, message: String },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl ClientError {
    /// Error code of a service error response
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<ClientError> for mcp_server::ToolError {
    fn from(err: ClientError) -> Self {
        mcp_server::ToolError::Upstream(err.to_string())
    }
}
