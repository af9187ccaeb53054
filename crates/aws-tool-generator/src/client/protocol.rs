//! Request encoding and response decoding for the `query` and `json` protocols

use regex::Regex;
use serde_json::{Map, Number, Value};
use service_model::{OperationModel, Protocol, ServiceModel, Shape};
use std::sync::LazyLock;

use super::error::ClientError;

static XML_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Code>([^<]*)</Code>").expect("valid code pattern"));
static XML_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Message>([^<]*)</Message>").expect("valid message pattern"));

/// A serialized request body plus the protocol headers that go with it
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedRequest {
    pub content_type: String,
    pub target: Option<String>,
    pub accept: Option<&'static str>,
    pub body: String,
}

/// Serialize the parameters of an operation call
pub(crate) fn encode_request(
    model: &ServiceModel,
    operation: &OperationModel,
    params: &Map<String, Value>,
) -> EncodedRequest {
    match model.metadata.protocol {
        Protocol::Query => {
            let mut pairs = vec![
                ("Action".to_string(), operation.name.clone()),
                ("Version".to_string(), model.metadata.api_version.clone()),
            ];
            let input = Shape::Structure {
                members: operation.input.clone(),
            };
            serialize_query("", &Value::Object(params.clone()), &input, &mut pairs);

            let body = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish();

            EncodedRequest {
                content_type: "application/x-www-form-urlencoded; charset=utf-8".to_string(),
                target: None,
                accept: Some("application/json"),
                body,
            }
        }
        Protocol::Json => {
            let json_version = model.metadata.json_version.as_deref().unwrap_or("1.0");
            let target_prefix = model
                .metadata
                .target_prefix
                .as_deref()
                .unwrap_or(&model.metadata.service_id);

            EncodedRequest {
                content_type: format!("application/x-amz-json-{}", json_version),
                target: Some(format!("{}.{}", target_prefix, operation.name)),
                accept: None,
                body: Value::Object(params.clone()).to_string(),
            }
        }
    }
}

fn serialize_query(prefix: &str, value: &Value, shape: &Shape, out: &mut Vec<(String, String)>) {
    match (shape, value) {
        (_, Value::Null) => {}
        (Shape::Structure { members }, Value::Object(fields)) => {
            for member in members {
                if let Some(field) = fields.get(&member.name) {
                    let key = join(prefix, member.wire_name());
                    serialize_query(&key, field, &member.shape, out);
                }
            }
        }
        (
            Shape::List {
                member,
                member_name,
                flattened,
            },
            Value::Array(items),
        ) => {
            if items.is_empty() {
                out.push((prefix.to_string(), String::new()));
                return;
            }
            let list_prefix = if *flattened {
                prefix.to_string()
            } else {
                join(prefix, member_name)
            };
            for (i, item) in items.iter().enumerate() {
                serialize_query(&format!("{}.{}", list_prefix, i + 1), item, member, out);
            }
        }
        (
            Shape::Map {
                value: value_shape,
                key_name,
                value_name,
                flattened,
                ..
            },
            Value::Object(entries),
        ) => {
            let entry_prefix = if *flattened {
                prefix.to_string()
            } else {
                join(prefix, "entry")
            };
            for (i, (key, entry)) in entries.iter().enumerate() {
                let base = format!("{}.{}", entry_prefix, i + 1);
                out.push((format!("{}.{}", base, key_name), key.clone()));
                serialize_query(&format!("{}.{}", base, value_name), entry, value_shape, out);
            }
        }
        (_, Value::String(s)) => out.push((prefix.to_string(), s.clone())),
        (_, Value::Bool(b)) => out.push((prefix.to_string(), b.to_string())),
        (_, Value::Number(n)) => out.push((prefix.to_string(), n.to_string())),
        // Shape mismatches are rejected before encoding; serialize what is left as JSON
        (_, other) => out.push((prefix.to_string(), other.to_string())),
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// A decoded successful response
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DecodedResponse {
    pub result: Map<String, Value>,
    pub request_id: Option<String>,
}

/// Decode the body of a successful response
pub(crate) fn decode_response(
    model: &ServiceModel,
    operation: &OperationModel,
    body: &str,
) -> Result<DecodedResponse, ClientError> {
    let malformed = |message: String| ClientError::Decode {
        operation: operation.name.clone(),
        message,
    };

    if body.trim().is_empty() {
        return Ok(DecodedResponse {
            result: Map::new(),
            request_id: None,
        });
    }

    let document: Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;

    match model.metadata.protocol {
        Protocol::Json => match document {
            Value::Object(result) => Ok(DecodedResponse {
                result,
                request_id: None,
            }),
            other => Err(malformed(format!("expected an object, got {}", other))),
        },
        Protocol::Query => {
            let envelope = document
                .get(format!("{}Response", operation.name))
                .unwrap_or(&document);

            let request_id = envelope
                .get("ResponseMetadata")
                .and_then(|m| m.get("RequestId"))
                .and_then(Value::as_str)
                .map(str::to_string);

            let payload = match &operation.result_wrapper {
                Some(wrapper) => envelope.get(wrapper).unwrap_or(&Value::Null),
                None => envelope,
            };

            let result = match (&operation.output, normalize(payload, operation.output.as_ref())) {
                (Some(_), Some(Value::Object(result))) => result,
                _ => Map::new(),
            };

            Ok(DecodedResponse { result, request_id })
        }
    }
}

/// Reshape a query protocol JSON document into the form the output shape describes
///
/// Query services encode maps as entry lists and may render scalars as
/// strings; both are converted back to their modelled JSON types.
fn normalize(value: &Value, shape: Option<&Shape>) -> Option<Value> {
    let Some(shape) = shape else {
        return Some(value.clone());
    };

    match (shape, value) {
        (_, Value::Null) => None,
        (Shape::Structure { members }, Value::Object(fields)) => {
            let mut result = Map::new();
            for member in members {
                let field = fields
                    .get(&member.name)
                    .or_else(|| fields.get(member.wire_name()));
                if let Some(normalized) = field.and_then(|f| normalize(f, Some(&member.shape))) {
                    result.insert(member.name.clone(), normalized);
                }
            }
            Some(Value::Object(result))
        }
        (Shape::List { member, .. }, Value::Array(items)) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| normalize(item, Some(member)))
                .collect(),
        )),
        (Shape::List { member_name, .. }, Value::Object(wrapper))
            if wrapper.len() == 1 && wrapper.contains_key(member_name) =>
        {
            normalize(&wrapper[member_name.as_str()], Some(shape))
        }
        (Shape::List { member, .. }, single) => {
            normalize(single, Some(member)).map(|v| Value::Array(vec![v]))
        }
        (Shape::Map { .. }, Value::Object(wrapper))
            if wrapper.len() == 1 && wrapper.contains_key("entry") =>
        {
            normalize(&wrapper["entry"], Some(shape))
        }
        (Shape::Map { value: value_shape, .. }, Value::Object(entries)) => {
            let mut result = Map::new();
            for (key, entry) in entries {
                if let Some(normalized) = normalize(entry, Some(value_shape)) {
                    result.insert(key.clone(), normalized);
                }
            }
            Some(Value::Object(result))
        }
        (
            Shape::Map {
                value: value_shape,
                key_name,
                value_name,
                ..
            },
            Value::Array(entries),
        ) => {
            let mut result = Map::new();
            for entry in entries {
                let key = entry
                    .get(key_name)
                    .or_else(|| entry.get("key"))
                    .and_then(Value::as_str);
                let value = entry.get(value_name).or_else(|| entry.get("value"));
                if let (Some(key), Some(value)) = (key, value) {
                    if let Some(normalized) = normalize(value, Some(value_shape)) {
                        result.insert(key.to_string(), normalized);
                    }
                }
            }
            Some(Value::Object(result))
        }
        (Shape::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => Some(value.clone()),
        },
        (Shape::Integer | Shape::Long, Value::String(s)) => Some(
            s.parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| value.clone()),
        ),
        (Shape::Float | Shape::Double, Value::String(s)) => Some(
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| value.clone()),
        ),
        _ => Some(value.clone()),
    }
}

/// Build the error for a non-success response
///
/// `query_error` is the `x-amzn-query-error` header JSON services send for
/// query-compatible error codes (`AWS.SimpleQueueService.NonExistentQueue;Sender`).
pub(crate) fn decode_error(
    operation: &str,
    status: u16,
    query_error: Option<&str>,
    body: &str,
) -> ClientError {
    let (code, message) = match serde_json::from_str::<Value>(body) {
        Ok(document) => {
            let error = document.get("Error");
            let code = document
                .get("__type")
                .or_else(|| document.get("code"))
                .or_else(|| error.and_then(|e| e.get("Code")))
                .and_then(Value::as_str)
                .map(|c| c.rsplit('#').next().unwrap_or(c).to_string());
            let message = document
                .get("message")
                .or_else(|| document.get("Message"))
                .or_else(|| error.and_then(|e| e.get("Message")))
                .and_then(Value::as_str)
                .map(str::to_string);
            (code, message)
        }
        Err(_) => (
            XML_CODE.captures(body).map(|c| c[1].to_string()),
            XML_MESSAGE.captures(body).map(|c| c[1].to_string()),
        ),
    };

    let code = query_error
        .and_then(|header| header.split(';').next())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .or(code)
        .unwrap_or_else(|| status.to_string());

    let message = message.unwrap_or_else(|| {
        if body.trim().is_empty() {
            "Unknown".to_string()
        } else {
            body.trim().to_string()
        }
    });

    ClientError::Service {
        operation: operation.to_string(),
        code,
        message,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use service_model::ModelLoader;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn form(body: &str) -> Vec<(String, String)> {
        url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn test_query_encoding_lists_and_maps() {
        let model = ModelLoader::new().load("sns").unwrap();
        let op = model.operation("CreateTopic").unwrap();

        let request = encode_request(
            &model,
            op,
            &params(json!({
                "Name": "orders.fifo",
                "Attributes": {"FifoTopic": "true"},
                "Tags": [{"Key": "mcp_server_version", "Value": "1.0.0"}]
            })),
        );

        assert_eq!(request.accept, Some("application/json"));
        assert!(request.content_type.starts_with("application/x-www-form-urlencoded"));
        assert_eq!(
            form(&request.body),
            vec![
                ("Action".to_string(), "CreateTopic".to_string()),
                ("Version".to_string(), "2010-03-31".to_string()),
                ("Name".to_string(), "orders.fifo".to_string()),
                ("Attributes.entry.1.key".to_string(), "FifoTopic".to_string()),
                ("Attributes.entry.1.value".to_string(), "true".to_string()),
                ("Tags.member.1.Key".to_string(), "mcp_server_version".to_string()),
                ("Tags.member.1.Value".to_string(), "1.0.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_encoding_message_attributes() {
        let model = ModelLoader::new().load("sns").unwrap();
        let op = model.operation("Publish").unwrap();

        let request = encode_request(
            &model,
            op,
            &params(json!({
                "TopicArn": "arn:aws:sns:us-east-1:123456789012:t",
                "Message": "hi",
                "MessageAttributes": {"kind": {"DataType": "String", "StringValue": "x"}}
            })),
        );
        let pairs = form(&request.body);

        assert!(pairs.contains(&("MessageAttributes.entry.1.Name".into(), "kind".into())));
        assert!(pairs.contains(&(
            "MessageAttributes.entry.1.Value.DataType".into(),
            "String".into()
        )));
        assert!(pairs.contains(&(
            "MessageAttributes.entry.1.Value.StringValue".into(),
            "x".into()
        )));
    }

    #[test]
    fn test_query_encoding_empty_list() {
        let model = ModelLoader::new().load("sns").unwrap();
        let op = model.operation("GetSMSAttributes").unwrap();

        let request = encode_request(&model, op, &params(json!({"attributes": []})));
        assert!(form(&request.body).contains(&("attributes".into(), String::new())));
    }

    #[test]
    fn test_json_encoding() {
        let model = ModelLoader::new().load("sqs").unwrap();
        let op = model.operation("SendMessage").unwrap();

        let request = encode_request(
            &model,
            op,
            &params(json!({"QueueUrl": "https://q", "MessageBody": "hello"})),
        );

        assert_eq!(request.content_type, "application/x-amz-json-1.0");
        assert_eq!(request.target.as_deref(), Some("AmazonSQS.SendMessage"));
        assert_eq!(request.accept, None);
        assert_eq!(
            serde_json::from_str::<Value>(&request.body).unwrap(),
            json!({"QueueUrl": "https://q", "MessageBody": "hello"})
        );
    }

    #[test]
    fn test_query_response_unwrapping() {
        let model = ModelLoader::new().load("sns").unwrap();
        let op = model.operation("CreateTopic").unwrap();

        let decoded = decode_response(
            &model,
            op,
            r#"{"CreateTopicResponse": {
                "CreateTopicResult": {"TopicArn": "arn:aws:sns:us-east-1:1:t"},
                "ResponseMetadata": {"RequestId": "req-1"}
            }}"#,
        )
        .unwrap();

        assert_eq!(decoded.result, params(json!({"TopicArn": "arn:aws:sns:us-east-1:1:t"})));
        assert_eq!(decoded.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_query_response_normalization() {
        let model = ModelLoader::new().load("sns").unwrap();

        let attrs = decode_response(
            &model,
            model.operation("GetTopicAttributes").unwrap(),
            r#"{"GetTopicAttributesResponse": {"GetTopicAttributesResult": {
                "Attributes": {"entry": [{"key": "TopicArn", "value": "arn"}, {"key": "Owner", "value": "1"}]}
            }}}"#,
        )
        .unwrap();
        assert_eq!(
            attrs.result,
            params(json!({"Attributes": {"TopicArn": "arn", "Owner": "1"}}))
        );

        let sandbox = decode_response(
            &model,
            model.operation("GetSMSSandboxAccountStatus").unwrap(),
            r#"{"GetSMSSandboxAccountStatusResponse": {"GetSMSSandboxAccountStatusResult": {"IsInSandbox": "true"}}}"#,
        )
        .unwrap();
        assert_eq!(sandbox.result, params(json!({"IsInSandbox": true})));

        let tags = decode_response(
            &model,
            model.operation("ListTagsForResource").unwrap(),
            r#"{"ListTagsForResourceResponse": {"ListTagsForResourceResult": {
                "Tags": {"member": [{"Key": "mcp_server_version", "Value": "1"}]}
            }}}"#,
        )
        .unwrap();
        assert_eq!(
            tags.result,
            params(json!({"Tags": [{"Key": "mcp_server_version", "Value": "1"}]}))
        );
    }

    #[test]
    fn test_query_response_without_output() {
        let model = ModelLoader::new().load("sns").unwrap();
        let decoded = decode_response(
            &model,
            model.operation("DeleteTopic").unwrap(),
            r#"{"DeleteTopicResponse": {"ResponseMetadata": {"RequestId": "req-2"}}}"#,
        )
        .unwrap();

        assert!(decoded.result.is_empty());
        assert_eq!(decoded.request_id.as_deref(), Some("req-2"));
    }

    #[test]
    fn test_decode_json_error() {
        let err = decode_error(
            "GetQueueUrl",
            400,
            Some("AWS.SimpleQueueService.NonExistentQueue;Sender"),
            r#"{"__type": "com.amazonaws.sqs#QueueDoesNotExist", "message": "The specified queue does not exist."}"#,
        );

        assert_eq!(err.code(), Some("AWS.SimpleQueueService.NonExistentQueue"));
        assert_eq!(
            err.to_string(),
            "An error occurred (AWS.SimpleQueueService.NonExistentQueue) when calling the \
             GetQueueUrl operation: The specified queue does not exist."
        );
    }

    #[test]
    fn test_decode_query_errors() {
        let json = decode_error(
            "DeleteTopic",
            404,
            None,
            r#"{"Error": {"Code": "NotFound", "Message": "Topic does not exist"}, "RequestId": "x"}"#,
        );
        assert_eq!(
            json.to_string(),
            "An error occurred (NotFound) when calling the DeleteTopic operation: Topic does not exist"
        );

        let xml = decode_error(
            "Publish",
            403,
            None,
            "<ErrorResponse><Error><Type>Sender</Type><Code>AuthorizationError</Code>\
             <Message>Not authorized</Message></Error></ErrorResponse>",
        );
        assert_eq!(xml.code(), Some("AuthorizationError"));

        let empty = decode_error("ListTopics", 503, None, "");
        assert_eq!(
            empty.to_string(),
            "An error occurred (503) when calling the ListTopics operation: Unknown"
        );
    }
}
