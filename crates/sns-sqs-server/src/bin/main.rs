//! Amazon SNS/SQS MCP server CLI
//!
//! Serves the SNS and SQS tools over stdio by default, or over HTTP/SSE with
//! `--sse`. Logs always go to stderr so they never mix with the stdio
//! protocol stream.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use aws_tool_generator::{ClientConfig, ClientFactory};
use mcp_server::{McpServer, ServerMode};
use service_model::ModelLoader;
use sns_sqs_server::{Settings, INSTRUCTIONS, MCP_SERVER_VERSION, SERVER_NAME};

/// An AWS Model Context Protocol (MCP) server for Amazon SNS and SQS
#[derive(Parser, Debug)]
#[command(name = "amazon-sns-sqs-mcp-server")]
#[command(version)]
#[command(about = "An AWS Model Context Protocol (MCP) server for Amazon SNS and SQS")]
struct Args {
    /// Use the SSE transport instead of stdio
    #[arg(long, env = "SNS_SQS_MCP_SSE")]
    sse: bool,

    /// Port for the SSE transport (default: 8888)
    #[arg(long, env = "SNS_SQS_MCP_PORT")]
    port: Option<u16>,

    /// Address the SSE transport binds to
    #[arg(long, env = "SNS_SQS_MCP_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// AWS profile used to resolve credentials
    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Endpoint URL for every AWS service (e.g. a local emulator)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// JSON settings file
    #[arg(long = "config", env = "SNS_SQS_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of service models replacing the built-in ones
    #[arg(long, env = "SNS_SQS_MCP_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "SNS_SQS_MCP_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .with_context(|| format!("Invalid log level: {}", args.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let mut client_config = settings.apply(ClientConfig::from_env());
    if let Some(profile) = args.profile {
        client_config.profile = Some(profile);
    }
    if let Some(endpoint_url) = args.endpoint_url {
        client_config.endpoint_url = Some(endpoint_url);
    }

    let mut loader = ModelLoader::new();
    if let Some(dir) = args.models_dir.or(settings.models_dir.clone()) {
        loader = loader.with_search_path(dir);
    }

    let factory = ClientFactory::new(client_config).context("Failed to create AWS client")?;
    let (registry, _) = sns_sqs_server::build_registry(&loader, &factory)
        .context("Failed to generate tools")?;

    let mode = if args.sse {
        let addr = SocketAddr::new(args.host, args.port.unwrap_or(settings.port));
        info!("Starting MCP server on http://{}/sse", addr);
        ServerMode::Sse { addr }
    } else {
        info!("Starting MCP server in stdio mode");
        ServerMode::Stdio
    };

    McpServer::new(SERVER_NAME, MCP_SERVER_VERSION, registry)
        .with_instructions(INSTRUCTIONS)
        .with_mode(mode)
        .run()
        .await?;

    Ok(())
}
