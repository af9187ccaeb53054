use aws_credential_types::Credentials;
use aws_tool_generator::{ClientConfig, ClientFactory};
use mcp_server::protocol::{RequestHandler, ServerInfo};
use mcp_server::McpMessage;
use serde_json::{json, Value};
use service_model::ModelLoader;
use sns_sqs_server::{build_registry, INSTRUCTIONS, MCP_SERVER_VERSION, SERVER_NAME};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn handler(endpoint: &str) -> RequestHandler {
    let config = ClientConfig {
        endpoint_url: Some(endpoint.to_string()),
        ..Default::default()
    };
    let factory = ClientFactory::new(config)
        .unwrap()
        .with_credentials_provider(Arc::new(Credentials::new(
            "AKIDTEST", "secret", None, None, "test",
        )));

    let (registry, _) = build_registry(&ModelLoader::new(), &factory).unwrap();
    RequestHandler::new(
        Arc::new(registry),
        ServerInfo {
            name: SERVER_NAME.to_string(),
            version: MCP_SERVER_VERSION.to_string(),
        },
    )
    .with_instructions(INSTRUCTIONS)
}

async fn call_tool(handler: &RequestHandler, name: &str, arguments: Value) -> Value {
    let request = McpMessage::request(
        1,
        "tools/call",
        Some(json!({"name": name, "arguments": arguments})),
    );
    let response = handler.handle(request).await.unwrap();
    assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
    response.result.unwrap()
}

fn sqs_target(operation: &str) -> wiremock::matchers::HeaderExactMatcher {
    header("x-amz-target", format!("AmazonSQS.{}", operation).as_str())
}

#[tokio::test]
async fn test_initialize_and_list() {
    let server = MockServer::start().await;
    let handler = handler(&server.uri()).await;

    let init = handler
        .handle(McpMessage::request(
            1,
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "1.0"}
            })),
        ))
        .await
        .unwrap();
    let result = init.result.unwrap();
    assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    assert_eq!(result["instructions"], INSTRUCTIONS);

    let list = handler
        .handle(McpMessage::request(2, "tools/list", None))
        .await
        .unwrap();
    let tools = list.result.unwrap()["tools"].as_array().unwrap().clone();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();

    assert!(names.contains(&"create_topic"));
    assert!(names.contains(&"create_queue"));
    assert!(names.contains(&"set_topic_archive_policy"));
    assert!(!names.contains(&"tag_queue"));

    let send = tools.iter().find(|t| t["name"] == "send_message").unwrap();
    assert_eq!(send["inputSchema"]["properties"]["region"]["default"], "us-east-1");
}

#[tokio::test]
async fn test_create_queue_over_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(sqs_target("CreateQueue"))
        .and(body_partial_json(json!({
            "QueueName": "orders.fifo",
            "Attributes": {"FifoQueue": "true"},
            "tags": {"mcp_server_version": MCP_SERVER_VERSION}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-amzn-requestid", "req-1")
                .set_body_json(json!({
                    "QueueUrl": "http://localhost/123456789012/orders.fifo"
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler(&server.uri()).await;
    let result = call_tool(&handler, "create_queue", json!({"queue_name": "orders.fifo"})).await;

    assert!(result.get("isError").is_none());
    let text = result["content"][0]["text"].as_str().unwrap();
    let body: Value = serde_json::from_str(text).unwrap();
    assert_eq!(body["QueueUrl"], "http://localhost/123456789012/orders.fifo");
    assert_eq!(body["ResponseMetadata"]["RequestId"], "req-1");
}

#[tokio::test]
async fn test_send_message_checks_tags_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(sqs_target("ListQueueTags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Tags": {"mcp_server_version": "0.1.0"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(sqs_target("SendMessage"))
        .and(body_partial_json(json!({"MessageBody": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MessageId": "5fea7756-0ea4-451a-a703-a558b933e274",
            "MD5OfMessageBody": "5d41402abc4b2a76b9719d911017c592"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = handler(&server.uri()).await;
    let result = call_tool(
        &handler,
        "send_message",
        json!({"QueueUrl": "http://localhost/123456789012/orders", "MessageBody": "hello"}),
    )
    .await;

    assert!(result.get("isError").is_none());
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("5fea7756-0ea4-451a-a703-a558b933e274"));
}

#[tokio::test]
async fn test_delete_untagged_topic_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Action=ListTagsForResource"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ListTagsForResourceResponse": {
                "ListTagsForResourceResult": {"Tags": []},
                "ResponseMetadata": {"RequestId": "req-2"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("Action=DeleteTopic"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let handler = handler(&server.uri()).await;
    let result = call_tool(
        &handler,
        "delete_topic",
        json!({"TopicArn": "arn:aws:sns:us-east-1:123456789012:orders"}),
    )
    .await;

    assert_eq!(result["isError"], true);
    assert_eq!(
        result["content"][0]["text"],
        "mutating a resource without the mcp_server_version tag is not allowed"
    );
}

#[tokio::test]
async fn test_service_errors_are_tool_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(sqs_target("GetQueueUrl"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("x-amzn-query-error", "AWS.SimpleQueueService.NonExistentQueue;Sender")
                .set_body_json(json!({
                    "__type": "com.amazonaws.sqs#QueueDoesNotExist",
                    "message": "The specified queue does not exist."
                })),
        )
        .mount(&server)
        .await;

    let handler = handler(&server.uri()).await;
    let result = call_tool(&handler, "get_queue_url", json!({"QueueName": "missing"})).await;

    assert_eq!(result["isError"], true);
    assert_eq!(
        result["content"][0]["text"],
        "An error occurred (AWS.SimpleQueueService.NonExistentQueue) when calling the \
         GetQueueUrl operation: The specified queue does not exist."
    );
}
