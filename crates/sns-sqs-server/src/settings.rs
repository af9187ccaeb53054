//! Server settings
//!
//! Optional JSON file for values that are awkward to pass as flags, such as
//! per-service endpoints. Absent fields take their defaults; command line
//! flags take precedence over the file.

use aws_tool_generator::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Port of the SSE transport when neither flag nor file names one
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid settings file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// AWS profile for the default credential chain
    pub profile: Option<String>,
    /// Endpoint for every service (e.g. a local emulator)
    pub endpoint_url: Option<String>,
    /// Per-service endpoints keyed by service id ("sns", "sqs")
    pub service_endpoints: BTreeMap<String, String>,
    /// Directory with service models replacing the built-in ones
    pub models_dir: Option<PathBuf>,
    /// HTTP request timeout for AWS calls; must be positive
    pub request_timeout_seconds: u64,
    /// SSE transport port
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            profile: None,
            endpoint_url: None,
            service_endpoints: BTreeMap::new(),
            models_dir: None,
            request_timeout_seconds: 60,
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// Load settings from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if settings.request_timeout_seconds == 0 {
            return Err(SettingsError::Invalid {
                path: path.to_path_buf(),
                message: "requestTimeoutSeconds must be greater than 0".to_string(),
            });
        }

        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Layer these settings over a client configuration
    ///
    /// Values set here replace the ones in `config`; unset values keep it.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(profile) = &self.profile {
            config.profile = Some(profile.clone());
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            config.endpoint_url = Some(endpoint_url.clone());
        }
        for (service, url) in &self.service_endpoints {
            config
                .service_endpoints
                .insert(service.to_lowercase(), url.clone());
        }
        if self.request_timeout_seconds > 0 {
            config.timeout = Duration::from_secs(self.request_timeout_seconds);
        }
        config
    }
}
