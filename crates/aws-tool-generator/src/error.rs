//! Error types for tool generation

use mcp_server::RegistryError;
use service_model::ModelError;
use thiserror::Error;

use crate::client::ClientError;

/// Errors that abort tool generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to load service catalog: {0}")]
    Catalog(#[from] ModelError),

    #[error("Failed to register tool: {0}")]
    Registry(#[from] RegistryError),

    #[error("Failed to create client: {0}")]
    Client(#[from] ClientError),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
