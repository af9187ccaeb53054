//! Catalog-driven tool generation

use mcp_server::{McpTool, RegistryError, ToolRegistry};
use service_model::{ModelLoader, ServiceModel};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::accessor::SharedAccessor;
use crate::client::ClientFactory;
use crate::config::{OperationConfig, ServiceConfig};
use crate::docs::tool_description;
use crate::error::GeneratorResult;
use crate::schema::input_schema;
use crate::tool::GenericTool;

/// What a generation pass registered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Generic tools, by tool name
    pub generated: Vec<String>,
    /// Operations handed to an override factory
    pub overridden: Vec<String>,
    /// Operations skipped by configuration
    pub ignored: Vec<String>,
    /// Tools not registered because the name was already taken
    pub shadowed: Vec<String>,
}

impl GenerationReport {
    /// Number of tools this pass added to the registry
    pub fn registered(&self) -> usize {
        self.generated.len() + self.overridden.len()
    }
}

/// Turns every operation of a service catalog into a tool
pub struct AwsToolGenerator {
    model: Arc<ServiceModel>,
    display_name: String,
    accessor: SharedAccessor,
    config: ServiceConfig,
    skip_param_documentation: bool,
}

impl AwsToolGenerator {
    pub fn new(
        model: Arc<ServiceModel>,
        display_name: impl Into<String>,
        accessor: SharedAccessor,
    ) -> Self {
        Self {
            model,
            display_name: display_name.into(),
            accessor,
            config: ServiceConfig::new(),
            skip_param_documentation: false,
        }
    }

    /// Load a service's catalog and bind it to clients from `factory`
    pub fn for_service(
        loader: &ModelLoader,
        service_name: &str,
        display_name: impl Into<String>,
        factory: &ClientFactory,
    ) -> GeneratorResult<Self> {
        let model = Arc::new(loader.load(service_name)?);
        let accessor = factory.accessor(model.clone());
        Ok(Self::new(model, display_name, accessor))
    }

    /// Replace the whole operation configuration
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure a single operation by tool name
    pub fn with_operation(mut self, tool_name: impl Into<String>, config: OperationConfig) -> Self {
        self.config.insert(tool_name.into(), config);
        self
    }

    /// Leave parameter listings out of every generated description
    pub fn skip_param_documentation(mut self, skip: bool) -> Self {
        self.skip_param_documentation = skip;
        self
    }

    pub fn model(&self) -> &ServiceModel {
        &self.model
    }

    pub fn accessor(&self) -> SharedAccessor {
        self.accessor.clone()
    }

    /// Register one tool per non-ignored operation, in catalog order
    pub fn generate(&self, registry: &mut ToolRegistry) -> GeneratorResult<GenerationReport> {
        let mut report = GenerationReport::default();

        for key in self.config.keys() {
            if self.model.operation_by_tool_name(key).is_none() {
                warn!(
                    "{}: configured operation {} is not in the catalog",
                    self.display_name, key
                );
            }
        }

        let default_config = OperationConfig::default();

        for operation in &self.model.operations {
            let tool_name = operation.tool_name();
            let config = self.config.get(&tool_name).unwrap_or(&default_config);

            match config {
                OperationConfig::Ignore => {
                    debug!("Ignoring {}", tool_name);
                    report.ignored.push(tool_name);
                }
                OperationConfig::Override(factory) => {
                    match factory(registry, self.accessor.clone(), operation) {
                        Ok(()) => report.overridden.push(tool_name),
                        Err(RegistryError::Duplicate(name)) => {
                            warn!("Override for {} shadowed by existing tool {}", tool_name, name);
                            report.shadowed.push(name);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                OperationConfig::Generic {
                    validator,
                    documentation_override,
                    skip_param_documentation,
                } => {
                    let skip_params = self.skip_param_documentation || *skip_param_documentation;
                    let description = match documentation_override {
                        Some(doc) => doc.clone(),
                        None => tool_description(&self.display_name, operation, skip_params),
                    };

                    let definition = McpTool {
                        name: tool_name.clone(),
                        description: Some(description),
                        input_schema: input_schema(operation, !skip_params),
                    };
                    let handler = GenericTool::new(
                        operation.clone(),
                        self.accessor.clone(),
                        validator.clone(),
                    );

                    match registry.register(definition, Arc::new(handler)) {
                        Ok(()) => report.generated.push(tool_name),
                        Err(RegistryError::Duplicate(name)) => {
                            warn!("Tool {} already registered; keeping the first", name);
                            report.shadowed.push(name);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        info!(
            "{}: {} tools generated, {} overridden, {} ignored, {} shadowed",
            self.display_name,
            report.generated.len(),
            report.overridden.len(),
            report.ignored.len(),
            report.shadowed.len()
        );

        Ok(report)
    }
}
