//! Pre-call authorization

use async_trait::async_trait;
use futures::FutureExt;
use mcp_server::ToolRegistry;
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

use crate::client::{ClientError, ServiceClient};

/// Outcome of a validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(String),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    /// Denial reason; empty when allowed
    pub fn reason(&self) -> &str {
        match self {
            Verdict::Allow => "",
            Verdict::Deny(reason) => reason,
        }
    }
}

/// Decides whether a tool call may reach the underlying operation
///
/// Validators receive the live client for the call's region so they can
/// look up the state of the target resource. An `Err` is treated as a
/// denial carrying the error message.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(
        &self,
        registry: &ToolRegistry,
        client: &dyn ServiceClient,
        arguments: &Map<String, Value>,
    ) -> Result<Verdict, ClientError>;
}

/// Run a validator, turning errors and panics into denials
pub async fn authorize(
    validator: &dyn Validator,
    registry: &ToolRegistry,
    client: &dyn ServiceClient,
    arguments: &Map<String, Value>,
) -> Verdict {
    let outcome = AssertUnwindSafe(validator.validate(registry, client, arguments))
        .catch_unwind()
        .await;

    let verdict = match outcome {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(e)) => Verdict::Deny(e.to_string()),
        Err(panic) => Verdict::Deny(panic_message(panic)),
    };

    match &verdict {
        Verdict::Allow => debug!("Validator allowed call"),
        Verdict::Deny(reason) => warn!("Validator denied call: {}", reason),
    }
    verdict
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "validator panicked".to_string()
    }
}
