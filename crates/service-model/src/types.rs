//! Type definitions for resolved AWS service models

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::naming::xform_name;

/// Wire protocol spoken by a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Form-encoded `Action=...&Version=...` requests (SNS)
    Query,
    /// `X-Amz-Target` JSON requests (SQS)
    Json,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Query => "query",
            Protocol::Json => "json",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Service-level metadata from the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceMetadata {
    /// Service id as published by AWS (e.g. "SNS")
    pub service_id: String,
    /// Full marketing name, if present
    pub full_name: Option<String>,
    /// Hostname prefix (e.g. "sns" for sns.us-east-1.amazonaws.com)
    pub endpoint_prefix: String,
    /// SigV4 signing name
    pub signing_name: String,
    /// Wire protocol
    pub protocol: Protocol,
    /// API version sent by the query protocol
    pub api_version: String,
    /// JSON protocol content-type version ("1.0" or "1.1")
    pub json_version: Option<String>,
    /// JSON protocol `X-Amz-Target` prefix
    pub target_prefix: Option<String>,
}

/// A resolved shape: the semantic type of a parameter or result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    String {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        enum_values: Vec<String>,
    },
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Timestamp,
    Blob,
    List {
        member: Box<Shape>,
        /// Query protocol element name (defaults to "member")
        member_name: String,
        flattened: bool,
    },
    Map {
        key: Box<Shape>,
        value: Box<Shape>,
        /// Query protocol entry key name (defaults to "key")
        key_name: String,
        /// Query protocol entry value name (defaults to "value")
        value_name: String,
        flattened: bool,
    },
    Structure {
        members: Vec<Member>,
    },
    /// Recursive shape cut off by the resolver depth limit
    Unresolved,
}

impl Shape {
    /// Plain string shape without enumerated values
    pub fn string() -> Self {
        Shape::String {
            enum_values: Vec::new(),
        }
    }

    /// Human-readable type name used in generated documentation
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::String { .. } => "string",
            Shape::Integer => "integer",
            Shape::Long => "long",
            Shape::Float => "float",
            Shape::Double => "double",
            Shape::Boolean => "boolean",
            Shape::Timestamp => "timestamp",
            Shape::Blob => "blob",
            Shape::List { .. } => "list",
            Shape::Map { .. } => "map",
            Shape::Structure { .. } => "structure",
            Shape::Unresolved => "any",
        }
    }

    /// Whether the shape is a list, map or structure
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Shape::List { .. } | Shape::Map { .. } | Shape::Structure { .. }
        )
    }

    /// Empty value of a container shape (`[]` or `{}`)
    pub fn empty_container(&self) -> Option<Value> {
        match self {
            Shape::List { .. } => Some(Value::Array(Vec::new())),
            Shape::Map { .. } | Shape::Structure { .. } => {
                Some(Value::Object(serde_json::Map::new()))
            }
            _ => None,
        }
    }

    /// Members of a structure shape (empty for other shapes)
    pub fn members(&self) -> &[Member] {
        match self {
            Shape::Structure { members } => members,
            _ => &[],
        }
    }
}

/// A named member of a structure: an operation parameter or a result field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Member name as accepted by the SDK (e.g. "TopicArn")
    pub name: String,
    /// Resolved member shape
    pub shape: Shape,
    /// Whether the enclosing structure requires this member
    pub required: bool,
    /// Declared default value
    pub default: Option<Value>,
    /// Member documentation (may contain HTML)
    pub documentation: Option<String>,
    /// Query protocol serialized name, when it differs from `name`
    pub location_name: Option<String>,
}

impl Member {
    /// Name used on the query protocol wire
    pub fn wire_name(&self) -> &str {
        self.location_name.as_deref().unwrap_or(&self.name)
    }
}

/// A single operation of a service catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationModel {
    /// Operation name as published by AWS (e.g. "CreateTopic")
    pub name: String,
    /// Operation documentation (may contain HTML)
    pub documentation: Option<String>,
    /// Whether the operation is deprecated
    pub deprecated: bool,
    /// Ordered input parameters
    pub input: Vec<Member>,
    /// Output shape
    pub output: Option<Shape>,
    /// Query protocol result element wrapping the output
    pub result_wrapper: Option<String>,
}

impl OperationModel {
    /// Canonical snake_case tool name (e.g. "create_topic")
    pub fn tool_name(&self) -> String {
        xform_name(&self.name)
    }

    /// Look up an input parameter by name
    pub fn parameter(&self, name: &str) -> Option<&Member> {
        self.input.iter().find(|m| m.name == name)
    }

    /// Names of required input parameters, in declaration order
    pub fn required_parameters(&self) -> Vec<&str> {
        self.input
            .iter()
            .filter(|m| m.required)
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Members of the output structure
    pub fn output_members(&self) -> &[Member] {
        self.output.as_ref().map(Shape::members).unwrap_or(&[])
    }
}

/// A resolved service catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceModel {
    /// Service identifier the model was loaded under (e.g. "sns")
    pub service_name: String,
    /// Service metadata
    pub metadata: ServiceMetadata,
    /// Service documentation
    pub documentation: Option<String>,
    /// Operations in catalog order
    pub operations: Vec<OperationModel>,
}

impl ServiceModel {
    /// Look up an operation by its AWS name ("CreateTopic")
    pub fn operation(&self, name: &str) -> Option<&OperationModel> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Look up an operation by its snake_case tool name ("create_topic")
    pub fn operation_by_tool_name(&self, tool_name: &str) -> Option<&OperationModel> {
        self.operations.iter().find(|op| op.tool_name() == tool_name)
    }

    /// AWS operation names in catalog order
    pub fn operation_names(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.name.as_str()).collect()
    }
}

// --- Raw botocore service-2.json structures for parsing ---

/// Raw service model document
#[derive(Debug, Clone, Deserialize)]
pub struct RawServiceModel {
    pub metadata: RawMetadata,
    pub documentation: Option<String>,
    #[serde(default)]
    pub operations: IndexMap<String, RawOperation>,
    #[serde(default)]
    pub shapes: IndexMap<String, RawShape>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    pub api_version: String,
    pub endpoint_prefix: String,
    pub protocol: String,
    pub service_id: String,
    pub service_full_name: Option<String>,
    pub signing_name: Option<String>,
    pub json_version: Option<String>,
    pub target_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOperation {
    pub name: String,
    pub input: Option<RawShapeRef>,
    pub output: Option<RawShapeRef>,
    pub documentation: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
}

/// Reference from an operation or member to a named shape
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawShapeRef {
    pub shape: String,
    pub documentation: Option<String>,
    pub location_name: Option<String>,
    pub result_wrapper: Option<String>,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShape {
    #[serde(rename = "type")]
    pub shape_type: String,
    #[serde(default)]
    pub members: IndexMap<String, RawShapeRef>,
    #[serde(default)]
    pub required: Vec<String>,
    pub member: Option<RawShapeRef>,
    pub key: Option<RawShapeRef>,
    pub value: Option<RawShapeRef>,
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
    #[serde(default)]
    pub flattened: bool,
    pub documentation: Option<String>,
}
