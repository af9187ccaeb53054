//! # sns-sqs-server
//!
//! MCP server exposing Amazon SNS and Amazon SQS. Tools are generated from
//! the service catalogs; resources created through the server are tagged,
//! and mutating tools only act on tagged resources.

pub mod common;
pub mod settings;
pub mod sns;
pub mod sqs;

use aws_tool_generator::{ClientFactory, GenerationReport, GeneratorResult};
use mcp_server::ToolRegistry;
use service_model::ModelLoader;
use std::sync::Arc;
use tracing::info;

pub use common::{validate_mcp_server_version_tag, MCP_SERVER_VERSION, MCP_SERVER_VERSION_TAG};
pub use settings::{Settings, SettingsError};

/// Server name reported on initialize
pub const SERVER_NAME: &str = "awslabs.amazon-sns-sqs-mcp-server";

/// Usage instructions reported on initialize
pub const INSTRUCTIONS: &str =
    "Manage Amazon SNS topics, subscriptions, and Amazon SQS queues for messaging.";

/// Register the SNS tools, then the SQS tools
///
/// SNS goes first, so where both catalogs share an operation name
/// (`add_permission`, `remove_permission`) the SNS tool is the one served.
pub fn build_registry(
    loader: &ModelLoader,
    factory: &ClientFactory,
) -> GeneratorResult<(ToolRegistry, Vec<GenerationReport>)> {
    let mut registry = ToolRegistry::new();

    let sns_model = Arc::new(loader.load(sns::SERVICE_NAME)?);
    let sns = sns::register(&mut registry, sns_model.clone(), factory.accessor(sns_model))?;

    let sqs_model = Arc::new(loader.load(sqs::SERVICE_NAME)?);
    let sqs = sqs::register(&mut registry, sqs_model.clone(), factory.accessor(sqs_model))?;

    info!("{} tools available", registry.len());
    Ok((registry, vec![sns, sqs]))
}
