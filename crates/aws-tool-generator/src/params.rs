//! Tool argument preparation and validation

use mcp_server::ToolError;
use regex::Regex;
use serde_json::{Map, Value};
use service_model::{Member, Shape};
use std::sync::LazyLock;

/// Region used when a call does not name one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Name of the extra parameter every generated tool accepts
pub const REGION_PARAM: &str = "region";

static REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d{1,2}$").expect("valid region pattern"));

/// Remove the `region` argument, falling back to [`DEFAULT_REGION`]
pub fn take_region(arguments: &mut Map<String, Value>) -> Result<String, ToolError> {
    match arguments.remove(REGION_PARAM) {
        None | Some(Value::Null) => Ok(DEFAULT_REGION.to_string()),
        Some(Value::String(region)) if REGION.is_match(&region) => Ok(region),
        Some(Value::String(region)) => Err(ToolError::Validation(format!(
            "Invalid region: {:?} is not an AWS region code such as us-east-1",
            region
        ))),
        Some(other) => Err(ToolError::Validation(format!(
            "Invalid type for parameter region, value: {}, type: {}, valid types: string",
            other,
            json_type(&other)
        ))),
    }
}

/// Check arguments against the operation input and build the call parameters
///
/// Nulls are dropped as if omitted, declared defaults are filled in, and
/// every problem found is reported in a single validation error.
pub fn prepare(
    members: &[Member],
    arguments: Map<String, Value>,
) -> Result<Map<String, Value>, ToolError> {
    let mut params = match strip_nulls(Value::Object(arguments)) {
        Value::Object(params) => params,
        _ => Map::new(),
    };

    for member in members {
        if !params.contains_key(&member.name) {
            if let Some(default) = &member.default {
                params.insert(member.name.clone(), default.clone());
            }
        }
    }

    let mut errors = Vec::new();
    validate_structure(members, &params, "input", "", &mut errors);

    if errors.is_empty() {
        Ok(params)
    } else {
        Err(ToolError::Validation(errors.join("\n")))
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

fn validate_structure(
    members: &[Member],
    fields: &Map<String, Value>,
    label: &str,
    path: &str,
    errors: &mut Vec<String>,
) {
    for member in members.iter().filter(|m| m.required) {
        if !fields.contains_key(&member.name) {
            errors.push(format!(
                "Missing required parameter in {}: \"{}\"",
                label, member.name
            ));
        }
    }

    for (name, value) in fields {
        match members.iter().find(|m| &m.name == name) {
            Some(member) => {
                let member_path = if path.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{}", path, name)
                };
                validate_value(&member.shape, value, &member_path, errors);
            }
            None => {
                let valid: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
                errors.push(format!(
                    "Unknown parameter in {}: \"{}\", must be one of: {}",
                    label,
                    name,
                    valid.join(", ")
                ));
            }
        }
    }
}

fn validate_value(shape: &Shape, value: &Value, path: &str, errors: &mut Vec<String>) {
    let valid = match (shape, value) {
        (Shape::Unresolved, _) => true,
        (Shape::String { .. } | Shape::Blob, Value::String(_)) => true,
        (Shape::Timestamp, Value::String(_) | Value::Number(_)) => true,
        (Shape::Integer | Shape::Long, Value::Number(n)) => n.is_i64() || n.is_u64(),
        (Shape::Float | Shape::Double, Value::Number(_)) => true,
        (Shape::Boolean, Value::Bool(_)) => true,
        (Shape::List { member, .. }, Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                validate_value(member, item, &format!("{}[{}]", path, i), errors);
            }
            true
        }
        (Shape::Map { value: value_shape, .. }, Value::Object(entries)) => {
            for (key, entry) in entries {
                validate_value(value_shape, entry, &format!("{}.{}", path, key), errors);
            }
            true
        }
        (Shape::Structure { members }, Value::Object(fields)) => {
            validate_structure(members, fields, path, path, errors);
            true
        }
        _ => false,
    };

    if !valid {
        errors.push(format!(
            "Invalid type for parameter {}, value: {}, type: {}, valid types: {}",
            path,
            value,
            json_type(value),
            expected_type(shape)
        ));
    }
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

fn expected_type(shape: &Shape) -> &'static str {
    match shape {
        Shape::String { .. } | Shape::Blob => "string",
        Shape::Timestamp => "string, number",
        Shape::Integer | Shape::Long => "integer",
        Shape::Float | Shape::Double => "number",
        Shape::Boolean => "boolean",
        Shape::List { .. } => "array",
        Shape::Map { .. } | Shape::Structure { .. } => "object",
        Shape::Unresolved => "any",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use service_model::ModelLoader;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn members(service: &str, operation: &str) -> Vec<Member> {
        ModelLoader::new()
            .load(service)
            .unwrap()
            .operation(operation)
            .unwrap()
            .input
            .clone()
    }

    fn validation_message(err: ToolError) -> String {
        match err {
            ToolError::Validation(message) => message,
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_region_defaults_and_validation() {
        let mut arguments = args(json!({"Name": "t"}));
        assert_eq!(take_region(&mut arguments).unwrap(), "us-east-1");

        let mut arguments = args(json!({"region": null}));
        assert_eq!(take_region(&mut arguments).unwrap(), "us-east-1");

        for region in ["eu-west-1", "ap-southeast-2", "us-gov-west-1", "cn-north-1"] {
            let mut arguments = args(json!({ "region": region }));
            assert_eq!(take_region(&mut arguments).unwrap(), region);
            assert!(arguments.is_empty());
        }

        for bad in [json!("Moon-Base-1"), json!("us-east"), json!(""), json!(5)] {
            let mut arguments = args(json!({ "region": bad }));
            assert!(matches!(take_region(&mut arguments), Err(ToolError::Validation(_))));
        }
    }

    #[test]
    fn test_prepare_accepts_valid_arguments() {
        let params = prepare(
            &members("sns", "CreateTopic"),
            args(json!({
                "Name": "orders",
                "Attributes": {"DisplayName": "Orders"},
                "Tags": [{"Key": "team", "Value": "core"}],
                "DataProtectionPolicy": null
            })),
        )
        .unwrap();

        assert_eq!(params.len(), 3);
        assert!(!params.contains_key("DataProtectionPolicy"));
    }

    #[test]
    fn test_prepare_collects_every_error() {
        let err = prepare(
            &members("sns", "CreateTopic"),
            args(json!({
                "Attributes": {"DisplayName": 5},
                "Tags": [{"Key": "team"}],
                "Colour": "blue"
            })),
        )
        .unwrap_err();

        let message = validation_message(err.clone());
        assert!(err.to_string().starts_with("Parameter validation failed:\n"));
        assert!(message.contains("Missing required parameter in input: \"Name\""));
        assert!(message.contains(
            "Invalid type for parameter Attributes.DisplayName, value: 5, type: integer, valid types: string"
        ));
        assert!(message.contains("Missing required parameter in Tags[0]: \"Value\""));
        assert!(message.contains(
            "Unknown parameter in input: \"Colour\", must be one of: Name, Attributes, Tags, DataProtectionPolicy"
        ));
    }

    #[test]
    fn test_prepare_type_checks_numbers() {
        let fractional = prepare(
            &members("sqs", "ReceiveMessage"),
            args(json!({"QueueUrl": "https://q", "MaxNumberOfMessages": 2.5})),
        )
        .unwrap_err();
        assert!(validation_message(fractional).contains("MaxNumberOfMessages"));

        let whole = prepare(
            &members("sqs", "ReceiveMessage"),
            args(json!({"QueueUrl": "https://q", "MaxNumberOfMessages": 10})),
        );
        assert!(whole.is_ok());
    }

    #[test]
    fn test_prepare_fills_declared_defaults() {
        let input = vec![
            Member {
                name: "Name".to_string(),
                shape: Shape::string(),
                required: true,
                default: None,
                documentation: None,
                location_name: None,
            },
            Member {
                name: "Size".to_string(),
                shape: Shape::Integer,
                required: false,
                default: Some(json!(3)),
                documentation: None,
                location_name: None,
            },
        ];

        let first = prepare(&input, args(json!({"Name": "a"}))).unwrap();
        assert_eq!(first["Size"], 3);

        let explicit = prepare(&input, args(json!({"Name": "b", "Size": 9}))).unwrap();
        assert_eq!(explicit["Size"], 9);

        // Defaults are copied per call
        let second = prepare(&input, args(json!({"Name": "c", "Size": null}))).unwrap();
        assert_eq!(second["Size"], 3);
        assert_eq!(input[1].default, Some(json!(3)));
    }
}
