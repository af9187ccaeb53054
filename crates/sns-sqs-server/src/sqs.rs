//! Amazon SQS tools
//!
//! Queue tagging is not exposed. `create_queue` always applies the marker
//! tag, and sending, receiving, deleting or reconfiguring is restricted to
//! queues that carry it.

use async_trait::async_trait;
use aws_tool_generator::params::{prepare, take_region};
use aws_tool_generator::schema::region_schema;
use aws_tool_generator::{
    AwsToolGenerator, ClientError, GenerationReport, GeneratorResult, OperationConfig,
    ServiceClient, ServiceConfig, SharedAccessor, Validator, Verdict,
};
use mcp_server::{McpInputSchema, McpTool, RegistryError, ToolError, ToolHandler, ToolRegistry};
use serde_json::{json, Map, Value};
use service_model::{Member, OperationModel, ServiceModel};
use std::sync::Arc;
use tracing::{debug, info};

use crate::common::{
    non_empty_str, not_passed, object_or_empty, reject_unknown, required_string,
    validate_mcp_server_version_tag, MCP_SERVER_VERSION, MCP_SERVER_VERSION_TAG,
};

pub const SERVICE_NAME: &str = "sqs";
pub const DISPLAY_NAME: &str = "Amazon SQS";

const FIFO_SUFFIX: &str = ".fifo";

/// Operations restricted to tagged queues
const GATED_OPERATIONS: &[&str] = &[
    "delete_queue",
    "set_queue_attributes",
    "send_message",
    "receive_message",
    "send_message_batch",
    "delete_message",
];

/// Per-operation settings for the SQS catalog
pub fn config() -> ServiceConfig {
    let queue: Arc<dyn Validator> = Arc::new(QueueValidator);

    let mut config = ServiceConfig::new();
    config.insert("tag_queue".into(), OperationConfig::ignore());
    config.insert("untag_queue".into(), OperationConfig::ignore());
    config.insert(
        "create_queue".into(),
        OperationConfig::override_with(create_queue_override),
    );
    for name in GATED_OPERATIONS {
        config.insert(
            name.to_string(),
            OperationConfig::validated_by(queue.clone()),
        );
    }
    config
}

/// Register the SQS tools
pub fn register(
    registry: &mut ToolRegistry,
    model: Arc<ServiceModel>,
    accessor: SharedAccessor,
) -> GeneratorResult<GenerationReport> {
    let report = AwsToolGenerator::new(model, DISPLAY_NAME, accessor)
        .with_config(config())
        .skip_param_documentation(true)
        .generate(registry)?;

    info!("Registered {} SQS tools", report.registered());
    Ok(report)
}

fn create_queue_override(
    registry: &mut ToolRegistry,
    accessor: SharedAccessor,
    operation: &OperationModel,
) -> Result<(), RegistryError> {
    let mut properties = Map::new();
    properties.insert(
        "queue_name".into(),
        json!({
            "type": "string",
            "description": "Queue name; a name ending in .fifo creates a FIFO queue"
        }),
    );
    properties.insert(
        "attributes".into(),
        json!({
            "type": "object",
            "additionalProperties": {"type": "string"},
            "default": {},
            "description": "Queue attributes such as VisibilityTimeout or RedrivePolicy"
        }),
    );
    properties.insert(
        "tags".into(),
        json!({
            "type": "object",
            "additionalProperties": {"type": "string"},
            "default": {},
            "description": "Tags to apply in addition to the mcp_server_version tag"
        }),
    );
    properties.insert("region".into(), region_schema());

    let definition = McpTool {
        name: operation.tool_name(),
        description: Some(
            "Create an Amazon SQS queue tagged with mcp_server_version. Queues whose name \
             ends in .fifo are created as FIFO queues with per-message-group deduplication \
             and throughput."
                .to_string(),
        ),
        input_schema: McpInputSchema {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: Some(vec!["queue_name".to_string()]),
        },
    };

    let tool = CreateQueueTool {
        accessor,
        input: operation.input.clone(),
    };
    registry.register(definition, Arc::new(tool))
}

/// `CreateQueue` parameters for a queue carrying the marker tag
///
/// The caller's attributes and tags are copied, never modified.
pub fn create_queue_params(
    queue_name: &str,
    attributes: &Map<String, Value>,
    tags: &Map<String, Value>,
) -> Map<String, Value> {
    let mut attributes = attributes.clone();
    if queue_name.ends_with(FIFO_SUFFIX) {
        attributes.insert("FifoQueue".into(), json!("true"));
        attributes.insert("DeduplicationScope".into(), json!("messageGroup"));
        attributes.insert("FifoThroughputLimit".into(), json!("perMessageGroupId"));
    }

    let mut tags = tags.clone();
    tags.insert(MCP_SERVER_VERSION_TAG.into(), json!(MCP_SERVER_VERSION));

    let mut params = Map::new();
    params.insert("QueueName".into(), json!(queue_name));
    params.insert("Attributes".into(), Value::Object(attributes));
    params.insert("tags".into(), Value::Object(tags));
    params
}

struct CreateQueueTool {
    accessor: SharedAccessor,
    input: Vec<Member>,
}

#[async_trait]
impl ToolHandler for CreateQueueTool {
    async fn call(
        &self,
        _registry: &ToolRegistry,
        mut arguments: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let region = take_region(&mut arguments)?;
        reject_unknown(&arguments, &["queue_name", "attributes", "tags", "region"])?;

        let queue_name = required_string(&arguments, "queue_name")?;
        let attributes = object_or_empty(&arguments, "attributes")?;
        let tags = object_or_empty(&arguments, "tags")?;
        let params = prepare(&self.input, create_queue_params(&queue_name, &attributes, &tags))?;

        let client = self.accessor.client(&region).await?;
        debug!("Creating queue {} in {}", queue_name, region);
        Ok(client.call("CreateQueue", params).await?)
    }
}

/// Allows calls on queues carrying the marker tag
pub struct QueueValidator;

#[async_trait]
impl Validator for QueueValidator {
    async fn validate(
        &self,
        _registry: &ToolRegistry,
        client: &dyn ServiceClient,
        arguments: &Map<String, Value>,
    ) -> Result<Verdict, ClientError> {
        let Some(queue_url) = non_empty_str(arguments, "QueueUrl") else {
            return Ok(not_passed("QueueUrl"));
        };

        let mut params = Map::new();
        params.insert("QueueUrl".into(), json!(queue_url));
        let response = client.call("ListQueueTags", params).await?;

        let tags = response
            .get("Tags")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Ok(validate_mcp_server_version_tag(&tags))
    }
}
