//! JSON Schema inference from operation input shapes

use mcp_server::McpInputSchema;
use serde_json::{json, Map, Value};
use service_model::{OperationModel, Shape};

use crate::docs::strip_html;
use crate::params::{DEFAULT_REGION, REGION_PARAM};

/// Input schema for a generated tool
///
/// One property per input member plus the trailing `region` property.
/// Optional members advertise their declared default, or an empty
/// container for lists, maps and structures.
pub fn input_schema(operation: &OperationModel, describe_params: bool) -> McpInputSchema {
    let mut properties = Map::new();

    for member in &operation.input {
        let mut property = shape_schema(&member.shape);
        if let Value::Object(fields) = &mut property {
            if !member.required {
                if let Some(default) = member
                    .default
                    .clone()
                    .or_else(|| member.shape.empty_container())
                {
                    fields.insert("default".to_string(), default);
                }
            }
            if describe_params {
                if let Some(doc) = member.documentation.as_deref().map(strip_html) {
                    if !doc.is_empty() {
                        fields.insert("description".to_string(), Value::String(doc));
                    }
                }
            }
        }
        properties.insert(member.name.clone(), property);
    }

    properties.insert(REGION_PARAM.to_string(), region_schema());

    McpInputSchema {
        schema_type: "object".to_string(),
        properties: Some(properties),
        required: Some(
            operation
                .required_parameters()
                .into_iter()
                .map(str::to_string)
                .collect(),
        ),
    }
}

/// Schema of the `region` property shared by every tool
pub fn region_schema() -> Value {
    json!({
        "type": "string",
        "default": DEFAULT_REGION,
        "description": "AWS region to send the request to"
    })
}

/// JSON Schema for a shape
pub fn shape_schema(shape: &Shape) -> Value {
    match shape {
        Shape::String { enum_values } if !enum_values.is_empty() => {
            json!({"type": "string", "enum": enum_values})
        }
        Shape::String { .. } => json!({"type": "string"}),
        Shape::Integer | Shape::Long => json!({"type": "integer"}),
        Shape::Float | Shape::Double => json!({"type": "number"}),
        Shape::Boolean => json!({"type": "boolean"}),
        Shape::Timestamp => json!({"type": "string", "format": "date-time"}),
        Shape::Blob => json!({"type": "string", "contentEncoding": "base64"}),
        Shape::List { member, .. } => json!({"type": "array", "items": shape_schema(member)}),
        Shape::Map { key, value, .. } => {
            let mut schema = json!({
                "type": "object",
                "additionalProperties": shape_schema(value)
            });
            if let Shape::String { enum_values } = key.as_ref() {
                if !enum_values.is_empty() {
                    schema["propertyNames"] = json!({ "enum": enum_values });
                }
            }
            schema
        }
        Shape::Structure { members } => {
            let properties: Map<String, Value> = members
                .iter()
                .map(|m| (m.name.clone(), shape_schema(&m.shape)))
                .collect();
            let required: Vec<&str> = members
                .iter()
                .filter(|m| m.required)
                .map(|m| m.name.as_str())
                .collect();

            let mut schema = json!({"type": "object", "properties": properties});
            if !required.is_empty() {
                schema["required"] = json!(required);
            }
            schema
        }
        Shape::Unresolved => json!({}),
    }
}
