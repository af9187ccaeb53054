//! Scripted service clients for exercising tools and validators without AWS.
//!
//! Enable with the `test-utils` feature:
//!
//! ```toml
//! [dev-dependencies]
//! aws-tool-generator = { workspace = true, features = ["test-utils"] }
//! ```

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::accessor::{ClientAccessor, SharedAccessor};
use crate::client::{ClientError, ServiceClient};

/// Answers operations from a fixed script and records every call
///
/// Operations without a scripted answer return an empty result carrying
/// only `ResponseMetadata`.
#[derive(Default)]
pub struct ScriptedClient {
    responses: HashMap<String, Result<Value, ClientError>>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, operation: &str, response: Value) -> Self {
        self.responses.insert(operation.to_string(), Ok(response));
        self
    }

    /// Answer `operation` with a service error
    pub fn fail(mut self, operation: &str, code: &str, message: &str) -> Self {
        self.responses.insert(
            operation.to_string(),
            Err(ClientError::Service {
                operation: operation.to_string(),
                code: code.to_string(),
                message: message.to_string(),
                status: 400,
            }),
        );
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|(op, _)| op).collect()
    }
}

#[async_trait]
impl ServiceClient for ScriptedClient {
    fn region(&self) -> &str {
        "us-east-1"
    }

    async fn call(&self, operation: &str, params: Map<String, Value>) -> Result<Value, ClientError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((operation.to_string(), params));
        }
        self.responses
            .get(operation)
            .cloned()
            .unwrap_or_else(|| Ok(json!({"ResponseMetadata": {"HTTPStatusCode": 200}})))
    }
}

/// Hands out the same scripted client for every region
pub struct ScriptedAccessor(pub Arc<ScriptedClient>);

#[async_trait]
impl ClientAccessor for ScriptedAccessor {
    async fn client(&self, _region: &str) -> Result<Arc<dyn ServiceClient>, ClientError> {
        Ok(self.0.clone())
    }
}

/// Shared accessor over `client`
pub fn accessor(client: &Arc<ScriptedClient>) -> SharedAccessor {
    Arc::new(ScriptedAccessor(client.clone()))
}

/// Tool arguments from a JSON object literal
pub fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
