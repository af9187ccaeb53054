//! MCP request handler

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::capabilities::ServerCapabilities;
use super::types::*;
use crate::tools::ToolRegistry;

/// Handler for MCP requests
///
/// Shared by every connection of a transport; requests may be handled
/// concurrently.
pub struct RequestHandler {
    /// Registered tools
    registry: Arc<ToolRegistry>,
    /// Name and version reported to clients
    server_info: ServerInfo,
    /// Usage instructions reported to clients
    instructions: Option<String>,
    /// Whether a client completed the handshake
    initialized: AtomicBool,
}

impl RequestHandler {
    /// Create a new request handler
    pub fn new(registry: Arc<ToolRegistry>, server_info: ServerInfo) -> Self {
        Self {
            registry,
            server_info,
            instructions: None,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Handle an incoming message
    pub async fn handle(&self, message: McpMessage) -> Option<McpMessage> {
        match (message.method.as_deref(), message.id.clone()) {
            (Some(method), Some(id)) => {
                debug!("Handling request: {}", method);

                let result = match method {
                    "initialize" => self.handle_initialize(message.params),
                    "ping" => Ok(serde_json::json!({})),
                    "tools/list" => self.handle_tools_list(),
                    "tools/call" => self.handle_tools_call(message.params).await,
                    _ => Err(McpError::method_not_found()),
                };

                Some(match result {
                    Ok(result) => McpMessage::response(id, result),
                    Err(error) => McpMessage::error_response(Some(id), error),
                })
            }
            (Some(method), None) => {
                match method {
                    "notifications/initialized" | "initialized" => {
                        self.initialized.store(true, Ordering::SeqCst);
                        info!("Client initialized");
                    }
                    "notifications/cancelled" => debug!("Request cancelled"),
                    _ => debug!("Unknown notification: {}", method),
                }
                None
            }
            (None, _) if message.is_response() => {
                debug!("Received unexpected response");
                None
            }
            (None, id) => Some(McpMessage::error_response(id, McpError::invalid_request())),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::invalid_params(e.to_string()))?
            .ok_or_else(|| McpError::invalid_params("Missing params"))?;

        info!(
            "Initializing session with client: {} v{} (protocol {})",
            params.client_info.name, params.client_info.version, params.protocol_version
        );

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities::with_tools(),
            server_info: self.server_info.clone(),
            instructions: self.instructions.clone(),
        };

        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }

    /// Handle tools/list request
    fn handle_tools_list(&self) -> Result<Value, McpError> {
        let result = ToolsListResult {
            tools: self.registry.list(),
        };
        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::invalid_params(e.to_string()))?
            .ok_or_else(|| McpError::invalid_params("Missing params"))?;

        let arguments = match params.arguments {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(McpError::invalid_params("Tool arguments must be an object")),
        };

        debug!("Calling tool: {}", params.name);

        let result = match self.registry.call(&params.name, arguments).await {
            Ok(Value::String(text)) => ToolCallResult::text(text),
            Ok(value) => ToolCallResult::text(
                serde_json::to_string_pretty(&value)
                    .map_err(|e| McpError::internal_error(e.to_string()))?,
            ),
            Err(e) => {
                match &e {
                    crate::tools::ToolError::Authorization(reason) => {
                        warn!("Tool {} denied: {}", params.name, reason)
                    }
                    _ => error!("Tool {} failed: {}", params.name, e),
                }
                ToolCallResult::error(e.to_string())
            }
        };

        serde_json::to_value(result).map_err(|e| McpError::internal_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolError, ToolHandler};
    use async_trait::async_trait;
    use serde_json::{json, Map};

    struct Greet;

    #[async_trait]
    impl ToolHandler for Greet {
        async fn call(
            &self,
            _registry: &ToolRegistry,
            arguments: Map<String, Value>,
        ) -> Result<Value, ToolError> {
            match arguments.get("name").and_then(Value::as_str) {
                Some(name) => Ok(json!({ "greeting": format!("hello {}", name) })),
                None => Err(ToolError::Authorization("name is not passed to the tool".into())),
            }
        }
    }

    fn handler() -> RequestHandler {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                McpTool {
                    name: "greet".to_string(),
                    description: Some("Greets".to_string()),
                    input_schema: McpInputSchema::default(),
                },
                Arc::new(Greet),
            )
            .unwrap();

        RequestHandler::new(
            Arc::new(registry),
            ServerInfo {
                name: "test-server".to_string(),
                version: "1.2.3".to_string(),
            },
        )
        .with_instructions("Say hello.")
    }

    #[tokio::test]
    async fn test_initialize() {
        let handler = handler();
        let request = McpMessage::request(
            1,
            "initialize",
            Some(json!({
                "protocolVersion": MCP_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0"}
            })),
        );

        let response = handler.handle(request).await.unwrap();
        let result = response.result.unwrap();

        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert_eq!(result["serverInfo"]["version"], "1.2.3");
        assert_eq!(result["instructions"], "Say hello.");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert!(!handler.is_initialized());

        let ack = McpMessage::notification("notifications/initialized", None);
        assert!(handler.handle(ack).await.is_none());
        assert!(handler.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_missing_params() {
        let response = handler()
            .handle(McpMessage::request(1, "initialize", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = handler()
            .handle(McpMessage::request(2, "tools/list", None))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].clone();

        assert_eq!(tools.as_array().unwrap().len(), 1);
        assert_eq!(tools[0]["name"], "greet");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn test_tools_call_success_is_pretty_json() {
        let response = handler()
            .handle(McpMessage::request(
                3,
                "tools/call",
                Some(json!({"name": "greet", "arguments": {"name": "sns"}})),
            ))
            .await
            .unwrap();
        let result: ToolCallResult = serde_json::from_value(response.result.unwrap()).unwrap();

        assert_eq!(result.is_error, None);
        let text = result.content[0].as_text();
        assert!(text.contains('\n'));
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            json!({"greeting": "hello sns"})
        );
    }

    #[tokio::test]
    async fn test_tools_call_errors_are_results() {
        let handler = handler();

        let denied = handler
            .handle(McpMessage::request(4, "tools/call", Some(json!({"name": "greet"}))))
            .await
            .unwrap();
        let result: ToolCallResult = serde_json::from_value(denied.result.unwrap()).unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content[0].as_text(), "name is not passed to the tool");

        let unknown = handler
            .handle(McpMessage::request(5, "tools/call", Some(json!({"name": "nope"}))))
            .await
            .unwrap();
        let result: ToolCallResult = serde_json::from_value(unknown.result.unwrap()).unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.content[0].as_text(), "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_tools_call_rejects_non_object_arguments() {
        let response = handler()
            .handle(McpMessage::request(
                6,
                "tools/call",
                Some(json!({"name": "greet", "arguments": [1, 2]})),
            ))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = handler()
            .handle(McpMessage::request(7, "resources/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_invalid_message() {
        let message: McpMessage = serde_json::from_value(json!({"jsonrpc": "2.0", "id": 8})).unwrap();
        let response = handler().handle(message).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
    }
}
