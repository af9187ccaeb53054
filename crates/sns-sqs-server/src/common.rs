//! Resource tagging rule and argument helpers shared by the service modules

use aws_tool_generator::Verdict;
use mcp_server::ToolError;
use serde_json::{Map, Value};

/// Tag marking resources created through this server
pub const MCP_SERVER_VERSION_TAG: &str = "mcp_server_version";

/// Value of the marker tag
pub const MCP_SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const UNTAGGED_RESOURCE: &str =
    "mutating a resource without the mcp_server_version tag is not allowed";

/// Allow mutations only on resources carrying the marker tag
///
/// `tags` maps tag keys to values; only the presence of the key matters.
pub fn validate_mcp_server_version_tag(tags: &Map<String, Value>) -> Verdict {
    if tags.contains_key(MCP_SERVER_VERSION_TAG) {
        Verdict::Allow
    } else {
        Verdict::Deny(UNTAGGED_RESOURCE.to_string())
    }
}

/// Denial for a call missing the identifier a validator needs
pub(crate) fn not_passed(parameter: &str) -> Verdict {
    Verdict::Deny(format!("{} is not passed to the tool", parameter))
}

/// String argument, `None` when absent, null or empty
pub(crate) fn non_empty_str<'a>(arguments: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub(crate) fn required_string(arguments: &Map<String, Value>, name: &str) -> Result<String, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Err(ToolError::Validation(format!(
            "Missing required parameter in input: \"{}\"",
            name
        ))),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(invalid_type(name, other, "string")),
    }
}

/// Copy of an object argument, empty when absent
pub(crate) fn object_or_empty(
    arguments: &Map<String, Value>,
    name: &str,
) -> Result<Map<String, Value>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(invalid_type(name, other, "object")),
    }
}

/// Copy of an array argument, empty when absent
pub(crate) fn array_or_empty(arguments: &Map<String, Value>, name: &str) -> Result<Vec<Value>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(invalid_type(name, other, "array")),
    }
}

/// Reject arguments a hand-written tool does not declare
pub(crate) fn reject_unknown(arguments: &Map<String, Value>, known: &[&str]) -> Result<(), ToolError> {
    let unknown: Vec<String> = arguments
        .keys()
        .filter(|k| !known.contains(&k.as_str()))
        .map(|k| format!("Unknown parameter in input: \"{}\", must be one of: {}", k, known.join(", ")))
        .collect();

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ToolError::Validation(unknown.join("\n")))
    }
}

fn invalid_type(name: &str, value: &Value, valid: &str) -> ToolError {
    ToolError::Validation(format!(
        "Invalid type for parameter {}, value: {}, type: {}, valid types: {}",
        name,
        value,
        json_type(value),
        valid
    ))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
