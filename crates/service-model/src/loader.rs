//! Service model loading

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ModelError, ModelResult};
use crate::resolver::ShapeResolver;
use crate::types::*;

/// Models compiled into the binary, keyed by service identifier
const BUILTIN_MODELS: &[(&str, &str)] = &[
    ("sns", include_str!("../models/sns.json")),
    ("sqs", include_str!("../models/sqs.json")),
];

/// Loads service catalogs from search directories and the built-in models
///
/// A directory on the search path may contain `<service>.json` files in the
/// botocore `service-2.json` format; they take precedence over built-in models.
#[derive(Debug, Clone, Default)]
pub struct ModelLoader {
    search_paths: Vec<PathBuf>,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory searched before the built-in models
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Service identifiers this loader can resolve
    pub fn available_services(&self) -> Vec<String> {
        let mut services: Vec<String> = BUILTIN_MODELS
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();

        for dir in &self.search_paths {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        if !services.iter().any(|s| s == stem) {
                            services.push(stem.to_string());
                        }
                    }
                }
            }
        }

        services.sort();
        services
    }

    /// Load the catalog for a service identifier (e.g. "sns")
    pub fn load(&self, service_name: &str) -> ModelResult<ServiceModel> {
        for dir in &self.search_paths {
            let candidate = dir.join(format!("{}.json", service_name));
            if candidate.is_file() {
                info!("Loading {} model from {}", service_name, candidate.display());
                return Self::load_file(service_name, &candidate);
            }
        }

        let content = BUILTIN_MODELS
            .iter()
            .find(|(name, _)| *name == service_name)
            .map(|(_, content)| *content)
            .ok_or_else(|| ModelError::UnknownService(service_name.to_string()))?;

        Self::parse(service_name, content)
    }

    /// Load a model file
    pub fn load_file(service_name: &str, path: &Path) -> ModelResult<ServiceModel> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(service_name, &content)
    }

    /// Parse a model document
    pub fn parse(service_name: &str, content: &str) -> ModelResult<ServiceModel> {
        let raw: RawServiceModel = serde_json::from_str(content)?;
        Self::convert_model(service_name, raw)
    }

    fn convert_model(service_name: &str, raw: RawServiceModel) -> ModelResult<ServiceModel> {
        let protocol = match raw.metadata.protocol.as_str() {
            "query" => Protocol::Query,
            "json" => Protocol::Json,
            other => return Err(ModelError::UnsupportedProtocol(other.to_string())),
        };

        if protocol == Protocol::Json && raw.metadata.target_prefix.is_none() {
            return Err(ModelError::InvalidFormat(
                "json protocol models need metadata.targetPrefix".to_string(),
            ));
        }

        debug!(
            "Parsing {} model ({} protocol, API {})",
            raw.metadata.service_id, protocol, raw.metadata.api_version
        );

        let resolver = ShapeResolver::new(&raw.shapes);
        let mut operations = Vec::with_capacity(raw.operations.len());

        for (name, op) in &raw.operations {
            if &op.name != name {
                return Err(ModelError::InvalidFormat(format!(
                    "operation key {} does not match its name {}",
                    name, op.name
                )));
            }

            let input = match &op.input {
                Some(input_ref) => resolver.resolve_members(&input_ref.shape)?,
                None => Vec::new(),
            };

            let (output, result_wrapper) = match &op.output {
                Some(output_ref) => (
                    Some(resolver.resolve(&output_ref.shape)?),
                    output_ref.result_wrapper.clone(),
                ),
                None => (None, None),
            };

            operations.push(OperationModel {
                name: op.name.clone(),
                documentation: op.documentation.clone(),
                deprecated: op.deprecated,
                input,
                output,
                result_wrapper,
            });
        }

        debug!("Resolved {} operations", operations.len());

        let metadata = ServiceMetadata {
            signing_name: raw
                .metadata
                .signing_name
                .unwrap_or_else(|| raw.metadata.endpoint_prefix.clone()),
            service_id: raw.metadata.service_id,
            full_name: raw.metadata.service_full_name,
            endpoint_prefix: raw.metadata.endpoint_prefix,
            protocol,
            api_version: raw.metadata.api_version,
            json_version: raw.metadata.json_version,
            target_prefix: raw.metadata.target_prefix,
        };

        Ok(ServiceModel {
            service_name: service_name.to_string(),
            metadata,
            documentation: raw.documentation,
            operations,
        })
    }
}
