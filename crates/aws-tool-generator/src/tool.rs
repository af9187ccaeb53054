//! Generic forwarding tool

use async_trait::async_trait;
use mcp_server::{ToolError, ToolHandler, ToolRegistry};
use serde_json::{Map, Value};
use service_model::OperationModel;
use std::sync::Arc;
use tracing::debug;

use crate::accessor::SharedAccessor;
use crate::params;
use crate::validator::{authorize, Validator, Verdict};

/// Tool forwarding its arguments to one catalog operation
///
/// A call validates the arguments, resolves the client for the requested
/// region, runs the validator if one is configured and only then invokes
/// the operation.
pub struct GenericTool {
    operation: OperationModel,
    accessor: SharedAccessor,
    validator: Option<Arc<dyn Validator>>,
}

impl GenericTool {
    pub fn new(
        operation: OperationModel,
        accessor: SharedAccessor,
        validator: Option<Arc<dyn Validator>>,
    ) -> Self {
        Self {
            operation,
            accessor,
            validator,
        }
    }
}

#[async_trait]
impl ToolHandler for GenericTool {
    async fn call(
        &self,
        registry: &ToolRegistry,
        mut arguments: Map<String, Value>,
    ) -> Result<Value, ToolError> {
        let region = params::take_region(&mut arguments)?;
        let params = params::prepare(&self.operation.input, arguments)?;

        let client = self.accessor.client(&region).await?;

        if let Some(validator) = &self.validator {
            if let Verdict::Deny(reason) =
                authorize(validator.as_ref(), registry, client.as_ref(), &params).await
            {
                return Err(ToolError::Authorization(reason));
            }
        }

        debug!("Invoking {} in {}", self.operation.name, region);
        Ok(client.call(&self.operation.name, params).await?)
    }
}
