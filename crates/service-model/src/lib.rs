//! # service-model
//!
//! AWS service model loader.
//! Resolves botocore-format `service-2.json` documents into an ordered operation
//! catalog with fully resolved parameter shapes.

mod error;
mod loader;
mod naming;
mod resolver;
mod types;

pub use error::{ModelError, ModelResult};
pub use loader::ModelLoader;
pub use naming::xform_name;
pub use resolver::ShapeResolver;
pub use types::*;
