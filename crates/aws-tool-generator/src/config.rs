//! Per-operation generation settings

use indexmap::IndexMap;
use mcp_server::{RegistryError, ToolRegistry};
use service_model::OperationModel;
use std::fmt;
use std::sync::Arc;

use crate::accessor::SharedAccessor;
use crate::validator::Validator;

/// Factory installing a replacement for an operation's tool
///
/// Called once at generation time with the registry, the service's client
/// accessor and the catalog operation being replaced. What it registers, and
/// under which name, is up to the factory; `operation.tool_name()` is the
/// canonical one.
pub type OverrideFactory = Arc<
    dyn Fn(&mut ToolRegistry, SharedAccessor, &OperationModel) -> Result<(), RegistryError>
        + Send
        + Sync,
>;

/// How a single catalog operation is turned into a tool
#[derive(Clone)]
pub enum OperationConfig {
    /// Register nothing
    Ignore,
    /// Let a factory register its own tool
    Override(OverrideFactory),
    /// Forward arguments to the operation
    Generic {
        validator: Option<Arc<dyn Validator>>,
        documentation_override: Option<String>,
        skip_param_documentation: bool,
    },
}

impl Default for OperationConfig {
    fn default() -> Self {
        OperationConfig::Generic {
            validator: None,
            documentation_override: None,
            skip_param_documentation: false,
        }
    }
}

impl OperationConfig {
    pub fn ignore() -> Self {
        OperationConfig::Ignore
    }

    pub fn override_with(
        factory: impl Fn(&mut ToolRegistry, SharedAccessor, &OperationModel) -> Result<(), RegistryError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        OperationConfig::Override(Arc::new(factory))
    }

    /// Generic tool gated by a validator
    pub fn validated(validator: impl Validator + 'static) -> Self {
        Self::validated_by(Arc::new(validator))
    }

    /// Generic tool gated by a shared validator
    pub fn validated_by(validator: Arc<dyn Validator>) -> Self {
        OperationConfig::Generic {
            validator: Some(validator),
            documentation_override: None,
            skip_param_documentation: false,
        }
    }

    /// Replace the generated description; no effect on ignored or overridden operations
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        if let OperationConfig::Generic {
            documentation_override,
            ..
        } = &mut self
        {
            *documentation_override = Some(documentation.into());
        }
        self
    }

    /// Leave parameter documentation out of the generated description and schema
    pub fn without_param_documentation(mut self) -> Self {
        if let OperationConfig::Generic {
            skip_param_documentation,
            ..
        } = &mut self
        {
            *skip_param_documentation = true;
        }
        self
    }
}

impl fmt::Debug for OperationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationConfig::Ignore => write!(f, "Ignore"),
            OperationConfig::Override(_) => write!(f, "Override(..)"),
            OperationConfig::Generic {
                validator,
                documentation_override,
                skip_param_documentation,
            } => f
                .debug_struct("Generic")
                .field("validated", &validator.is_some())
                .field("documentation_override", documentation_override)
                .field("skip_param_documentation", skip_param_documentation)
                .finish(),
        }
    }
}

/// Operation settings keyed by tool name ("create_topic")
///
/// Operations without an entry get a generic, ungated tool.
pub type ServiceConfig = IndexMap<String, OperationConfig>;
