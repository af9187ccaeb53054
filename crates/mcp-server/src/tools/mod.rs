//! Tool registration and dispatch

mod error;
mod registry;

pub use error::{RegistryError, ToolError};
pub use registry::{ToolHandler, ToolRegistry};
