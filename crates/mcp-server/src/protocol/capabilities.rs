//! Server capabilities

use serde::{Deserialize, Serialize};

/// Server capabilities advertised during initialization
///
/// Only tools are served; the tool set is fixed at startup so
/// `listChanged` is always reported as false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

impl ServerCapabilities {
    /// Create capabilities with tools support
    pub fn with_tools() -> Self {
        Self {
            tools: Some(ToolsCapability {
                list_changed: Some(false),
            }),
        }
    }
}

/// Tools capability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}
