//! Tool registry shared by the request handler and every tool

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};
use tracing::debug;

use super::error::{RegistryError, ToolError};
use crate::protocol::McpTool;

static TOOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{1,64}$").expect("valid tool name pattern"));

/// A callable tool
///
/// The registry is passed back into every call so tools can consult the
/// rest of the tool set without holding a reference to it.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(
        &self,
        registry: &ToolRegistry,
        arguments: Map<String, Value>,
    ) -> Result<Value, ToolError>;
}

struct RegisteredTool {
    definition: McpTool,
    handler: Arc<dyn ToolHandler>,
}

/// Ordered set of tools, keyed by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    ///
    /// The first registration of a name wins; later ones are rejected with
    /// [`RegistryError::Duplicate`] and leave the registry unchanged.
    pub fn register(
        &mut self,
        definition: McpTool,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if !TOOL_NAME.is_match(&definition.name) {
            return Err(RegistryError::InvalidName(definition.name));
        }
        if self.tools.contains_key(&definition.name) {
            return Err(RegistryError::Duplicate(definition.name));
        }

        debug!("Registered tool {}", definition.name);
        self.tools.insert(
            definition.name.clone(),
            RegisteredTool {
                definition,
                handler,
            },
        );
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definition of a registered tool
    pub fn get(&self, name: &str) -> Option<&McpTool> {
        self.tools.get(name).map(|t| &t.definition)
    }

    /// Tool definitions in registration order
    pub fn list(&self) -> Vec<McpTool> {
        self.tools.values().map(|t| t.definition.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke a tool by name
    pub async fn call(&self, name: &str, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.handler.call(self, arguments).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::McpInputSchema;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(
            &self,
            _registry: &ToolRegistry,
            arguments: Map<String, Value>,
        ) -> Result<Value, ToolError> {
            Ok(Value::Object(arguments))
        }
    }

    /// Calls another registered tool through the registry handle
    struct Forward(&'static str);

    #[async_trait]
    impl ToolHandler for Forward {
        async fn call(
            &self,
            registry: &ToolRegistry,
            arguments: Map<String, Value>,
        ) -> Result<Value, ToolError> {
            registry.call(self.0, arguments).await
        }
    }

    fn tool(name: &str) -> McpTool {
        McpTool {
            name: name.to_string(),
            description: Some(format!("{} tool", name)),
            input_schema: McpInputSchema::default(),
        }
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("zeta"), Arc::new(Echo)).unwrap();
        registry.register(tool("alpha"), Arc::new(Echo)).unwrap();

        assert_eq!(registry.names(), vec!["zeta", "alpha"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("alpha").unwrap().description.as_deref(), Some("alpha tool"));
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("echo"), Arc::new(Echo)).unwrap();

        let mut second = tool("echo");
        second.description = Some("second".to_string());
        let err = registry.register(second, Arc::new(Echo)).unwrap_err();

        assert_eq!(err, RegistryError::Duplicate("echo".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("echo").unwrap().description.as_deref(), Some("echo tool"));
    }

    #[test]
    fn test_invalid_names() {
        let mut registry = ToolRegistry::new();
        for name in ["", "has space", "dotted.name", &"x".repeat(65)] {
            let err = registry.register(tool(name), Arc::new(Echo)).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidName(_)));
        }
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_call_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("echo"), Arc::new(Echo)).unwrap();
        registry.register(tool("forward"), Arc::new(Forward("echo"))).unwrap();

        let mut args = Map::new();
        args.insert("a".to_string(), Value::from(1));

        let result = registry.call("forward", args).await.unwrap();
        assert_eq!(result, serde_json::json!({"a": 1}));

        let err = registry.call("missing", Map::new()).await.unwrap_err();
        assert_eq!(err, ToolError::NotFound("missing".to_string()));
        assert_eq!(err.to_string(), "Unknown tool: missing");
    }
}
