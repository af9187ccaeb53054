//! Amazon SNS tools
//!
//! Every SNS operation is exposed as a generated tool except tagging, which
//! is left out so the marker tag cannot be forged or removed. Topic creation
//! is replaced by a tool that always applies the marker tag, and operations
//! that change a topic or its subscriptions are only allowed on tagged topics.

use async_trait::async_trait;
use aws_tool_generator::params::{prepare, take_region};
use aws_tool_generator::schema::region_schema;
use aws_tool_generator::{
    authorize, AwsToolGenerator, ClientError, GenerationReport, GeneratorResult, OperationConfig,
    ServiceClient, ServiceConfig, SharedAccessor, Validator, Verdict,
};
use mcp_server::{
    McpInputSchema, McpTool, RegistryError, ToolError, ToolHandler, ToolRegistry,
};
use serde_json::{json, Map, Value};
use service_model::{Member, OperationModel, ServiceModel};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::common::{
    array_or_empty, non_empty_str, not_passed, object_or_empty, reject_unknown, required_string,
    validate_mcp_server_version_tag, MCP_SERVER_VERSION, MCP_SERVER_VERSION_TAG,
};

pub const SERVICE_NAME: &str = "sns";
pub const DISPLAY_NAME: &str = "Amazon SNS";

const SUBSCRIBE_DOCUMENTATION: &str =
    "Execute AWS SNS Subscribe. Ensure that you set correct permission policies if required.";

const FIFO_SUFFIX: &str = ".fifo";

/// Shortest and longest message retention of a topic archive, in days
const ARCHIVE_RETENTION_DAYS: std::ops::RangeInclusive<i64> = 1..=365;

/// Per-operation settings for the SNS catalog
pub fn config() -> ServiceConfig {
    let topic: Arc<dyn Validator> = Arc::new(TopicValidator);

    let mut config = ServiceConfig::new();
    config.insert("tag_resource".into(), OperationConfig::ignore());
    config.insert("untag_resource".into(), OperationConfig::ignore());
    config.insert(
        "create_topic".into(),
        OperationConfig::override_with(create_topic_override),
    );
    config.insert(
        "delete_topic".into(),
        OperationConfig::validated_by(topic.clone()),
    );
    config.insert(
        "set_topic_attributes".into(),
        OperationConfig::validated_by(topic.clone()),
    );
    config.insert(
        "subscribe".into(),
        OperationConfig::validated_by(topic.clone()).with_documentation(SUBSCRIBE_DOCUMENTATION),
    );
    config.insert(
        "unsubscribe".into(),
        OperationConfig::validated(SubscriptionValidator),
    );
    config.insert(
        "confirm_subscription".into(),
        OperationConfig::validated_by(topic.clone()),
    );
    config.insert("publish".into(), OperationConfig::validated_by(topic.clone()));
    config.insert("publish_batch".into(), OperationConfig::validated_by(topic));
    config
}

/// Register the SNS tools
pub fn register(
    registry: &mut ToolRegistry,
    model: Arc<ServiceModel>,
    accessor: SharedAccessor,
) -> GeneratorResult<GenerationReport> {
    let mut report = AwsToolGenerator::new(model, DISPLAY_NAME, accessor.clone())
        .with_config(config())
        .skip_param_documentation(true)
        .generate(registry)?;

    for policy in [ArchivePolicy::Set, ArchivePolicy::Remove] {
        let tool = ArchivePolicyTool {
            accessor: accessor.clone(),
            policy,
        };
        match registry.register(tool.definition(), Arc::new(tool)) {
            Ok(()) => report.generated.push(policy.tool_name().to_string()),
            Err(RegistryError::Duplicate(name)) => {
                warn!("Tool {} already registered; keeping the first", name);
                report.shadowed.push(name);
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Registered {} SNS tools", report.registered());
    Ok(report)
}

// --- Topic creation ---

fn create_topic_override(
    registry: &mut ToolRegistry,
    accessor: SharedAccessor,
    operation: &OperationModel,
) -> Result<(), RegistryError> {
    let tool = CreateTopicTool {
        accessor,
        input: operation.input.clone(),
    };
    registry.register(create_topic_definition(&operation.tool_name()), Arc::new(tool))
}

fn create_topic_definition(name: &str) -> McpTool {
    let mut properties = Map::new();
    properties.insert(
        "name".into(),
        json!({
            "type": "string",
            "description": "Topic name; a name ending in .fifo creates a FIFO topic"
        }),
    );
    properties.insert(
        "attributes".into(),
        json!({
            "type": "object",
            "additionalProperties": {"type": "string"},
            "default": {},
            "description": "Topic attributes such as DisplayName or Policy"
        }),
    );
    properties.insert(
        "tags".into(),
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {"Key": {"type": "string"}, "Value": {"type": "string"}},
                "required": ["Key", "Value"]
            },
            "default": [],
            "description": "Tags to apply in addition to the mcp_server_version tag"
        }),
    );
    properties.insert("region".into(), region_schema());

    McpTool {
        name: name.to_string(),
        description: Some(
            "Create an Amazon SNS topic tagged with mcp_server_version. Topics whose name \
             ends in .fifo are created as FIFO topics with per-message-group throughput."
                .to_string(),
        ),
        input_schema: McpInputSchema {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: Some(vec!["name".to_string()]),
        },
    }
}

/// `CreateTopic` parameters for a topic carrying the marker tag
///
/// The caller's attributes and tags are copied, never modified.
pub fn create_topic_params(name: &str, attributes: &Map<String, Value>, tags: &[Value]) -> Map<String, Value> {
    let mut attributes = attributes.clone();
    if name.ends_with(FIFO_SUFFIX) {
        attributes.insert("FifoTopic".into(), json!("true"));
        attributes.insert("FifoThroughputScope".into(), json!("MessageGroup"));
    }

    let mut tags = tags.to_vec();
    tags.push(json!({"Key": MCP_SERVER_VERSION_TAG, "Value": MCP_SERVER_VERSION}));

    let mut params = Map::new();
    params.insert("Name".into(), json!(name));
    params.insert("Attributes".into(), Value::Object(attributes));
    params.insert("Tags".into(), Value::Array(tags));
    params
}

struct CreateTopicTool {
    accessor: SharedAccessor,
    /// `CreateTopic` input members the built parameters are checked against
    input: Vec<Member>,
}

#[async_trait]
impl ToolHandler for CreateTopicTool {
    async fn call(
        &self,
        _registry: &ToolRegistry,
        mut arguments: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let region = take_region(&mut arguments)?;
        reject_unknown(&arguments, &["name", "attributes", "tags", "region"])?;

        let name = required_string(&arguments, "name")?;
        let attributes = object_or_empty(&arguments, "attributes")?;
        let tags = array_or_empty(&arguments, "tags")?;
        let params = prepare(&self.input, create_topic_params(&name, &attributes, &tags))?;

        let client = self.accessor.client(&region).await?;
        debug!("Creating topic {} in {}", name, region);
        Ok(client.call("CreateTopic", params).await?)
    }
}

// --- Validators ---

/// Allows calls on topics carrying the marker tag
pub struct TopicValidator;

#[async_trait]
impl Validator for TopicValidator {
    async fn validate(
        &self,
        _registry: &ToolRegistry,
        client: &dyn ServiceClient,
        arguments: &Map<String, Value>,
    ) -> Result<Verdict, ClientError> {
        match non_empty_str(arguments, "TopicArn") {
            Some(topic_arn) => topic_verdict(client, topic_arn).await,
            None => Ok(not_passed("TopicArn")),
        }
    }
}

/// Allows unsubscribing only from topics carrying the marker tag
pub struct SubscriptionValidator;

#[async_trait]
impl Validator for SubscriptionValidator {
    async fn validate(
        &self,
        _registry: &ToolRegistry,
        client: &dyn ServiceClient,
        arguments: &Map<String, Value>,
    ) -> Result<Verdict, ClientError> {
        let Some(subscription_arn) = non_empty_str(arguments, "SubscriptionArn") else {
            return Ok(not_passed("SubscriptionArn"));
        };

        let mut params = Map::new();
        params.insert("SubscriptionArn".into(), json!(subscription_arn));
        let response = client.call("GetSubscriptionAttributes", params).await?;

        match response
            .pointer("/Attributes/TopicArn")
            .and_then(Value::as_str)
            .filter(|arn| !arn.is_empty())
        {
            Some(topic_arn) => topic_verdict(client, topic_arn).await,
            None => Ok(not_passed("TopicArn")),
        }
    }
}

async fn topic_verdict(client: &dyn ServiceClient, topic_arn: &str) -> Result<Verdict, ClientError> {
    let mut params = Map::new();
    params.insert("ResourceArn".into(), json!(topic_arn));
    let response = client.call("ListTagsForResource", params).await?;

    let tags: Map<String, Value> = response
        .get("Tags")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|tag| {
            let key = tag.get("Key")?.as_str()?;
            Some((key.to_string(), tag.get("Value").cloned().unwrap_or(Value::Null)))
        })
        .collect();

    Ok(validate_mcp_server_version_tag(&tags))
}

// --- Archive policy ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchivePolicy {
    Set,
    Remove,
}

impl ArchivePolicy {
    fn tool_name(self) -> &'static str {
        match self {
            ArchivePolicy::Set => "set_topic_archive_policy",
            ArchivePolicy::Remove => "remove_topic_archive_policy",
        }
    }
}

/// Sets or clears the `ArchivePolicy` attribute of a tagged FIFO topic
struct ArchivePolicyTool {
    accessor: SharedAccessor,
    policy: ArchivePolicy,
}

impl ArchivePolicyTool {
    fn definition(&self) -> McpTool {
        let mut properties = Map::new();
        properties.insert(
            "TopicArn".into(),
            json!({"type": "string", "description": "ARN of the FIFO topic"}),
        );
        let mut required = vec!["TopicArn".to_string()];

        let description = match self.policy {
            ArchivePolicy::Set => {
                properties.insert(
                    "MessageRetentionPeriod".into(),
                    json!({
                        "type": "integer",
                        "minimum": ARCHIVE_RETENTION_DAYS.start(),
                        "maximum": ARCHIVE_RETENTION_DAYS.end(),
                        "description": "Days archived messages are retained"
                    }),
                );
                required.push("MessageRetentionPeriod".to_string());
                "Enable message archiving on an Amazon SNS FIFO topic, retaining published \
                 messages for MessageRetentionPeriod days (1-365). Only topics tagged with \
                 mcp_server_version can be changed."
            }
            ArchivePolicy::Remove => {
                "Disable message archiving on an Amazon SNS FIFO topic. Only topics tagged \
                 with mcp_server_version can be changed."
            }
        };
        properties.insert("region".into(), region_schema());

        McpTool {
            name: self.policy.tool_name().to_string(),
            description: Some(description.to_string()),
            input_schema: McpInputSchema {
                schema_type: "object".to_string(),
                properties: Some(properties),
                required: Some(required),
            },
        }
    }

    fn archive_policy(&self, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        match self.policy {
            ArchivePolicy::Remove => {
                reject_unknown(arguments, &["TopicArn", "region"])?;
                Ok(json!({}))
            }
            ArchivePolicy::Set => {
                reject_unknown(arguments, &["TopicArn", "MessageRetentionPeriod", "region"])?;
                let days = retention_days(arguments)?;
                Ok(json!({"MessageRetentionPeriod": days.to_string()}))
            }
        }
    }
}

fn retention_days(arguments: &Map<String, Value>) -> Result<i64, ToolError> {
    let value = arguments.get("MessageRetentionPeriod").unwrap_or(&Value::Null);
    let days = match value {
        Value::Null => {
            return Err(ToolError::Validation(
                "Missing required parameter in input: \"MessageRetentionPeriod\"".to_string(),
            ))
        }
        Value::Number(n) => n.as_i64(),
        _ => None,
    };

    match days {
        Some(days) if ARCHIVE_RETENTION_DAYS.contains(&days) => Ok(days),
        Some(days) => Err(ToolError::Validation(format!(
            "Invalid value for parameter MessageRetentionPeriod, value: {}, valid range: {}-{}",
            days,
            ARCHIVE_RETENTION_DAYS.start(),
            ARCHIVE_RETENTION_DAYS.end()
        ))),
        None => Err(ToolError::Validation(format!(
            "Invalid type for parameter MessageRetentionPeriod, value: {}, valid types: integer",
            value
        ))),
    }
}

#[async_trait]
impl ToolHandler for ArchivePolicyTool {
    async fn call(
        &self,
        registry: &ToolRegistry,
        mut arguments: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let region = take_region(&mut arguments)?;
        let policy = self.archive_policy(&arguments)?;
        let topic_arn = required_string(&arguments, "TopicArn")?;

        let client = self.accessor.client(&region).await?;

        let mut target = Map::new();
        target.insert("TopicArn".into(), json!(topic_arn));
        if let Verdict::Deny(reason) =
            authorize(&TopicValidator, registry, client.as_ref(), &target).await
        {
            return Err(ToolError::Authorization(reason));
        }

        let mut params = target;
        params.insert("AttributeName".into(), json!("ArchivePolicy"));
        params.insert("AttributeValue".into(), json!(policy.to_string()));

        debug!("Setting archive policy {} on {}", policy, topic_arn);
        Ok(client.call("SetTopicAttributes", params).await?)
    }
}
