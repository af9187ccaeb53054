//! # aws-tool-generator
//!
//! Generates MCP tools from AWS service catalogs. Each catalog operation
//! becomes a tool with an inferred input schema, unless its
//! [`OperationConfig`] ignores it or installs an override; generic tools
//! can be gated by a [`Validator`].
//!
//! ```ignore
//! let factory = ClientFactory::new(ClientConfig::from_env())?;
//! let generator = AwsToolGenerator::for_service(&ModelLoader::new(), "sqs", "Amazon SQS", &factory)?
//!     .with_operation("tag_queue", OperationConfig::ignore());
//! let report = generator.generate(&mut registry)?;
//! ```

pub mod accessor;
pub mod client;
pub mod config;
pub mod docs;
mod error;
mod generator;
pub mod params;
pub mod schema;
#[cfg(feature = "test-utils")]
pub mod test_utils;
mod tool;
pub mod validator;

pub use accessor::{ClientAccessor, RegionalClients, SharedAccessor};
pub use client::{AwsServiceClient, ClientConfig, ClientError, ClientFactory, ServiceClient};
pub use config::{OperationConfig, OverrideFactory, ServiceConfig};
pub use error::{GeneratorError, GeneratorResult};
pub use generator::{AwsToolGenerator, GenerationReport};
pub use params::DEFAULT_REGION;
pub use tool::GenericTool;
pub use validator::{authorize, Validator, Verdict};
