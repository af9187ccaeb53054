//! Region to client resolution

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{ClientError, ServiceClient};

/// Resolves a region to a live service client
#[async_trait]
pub trait ClientAccessor: Send + Sync {
    async fn client(&self, region: &str) -> Result<Arc<dyn ServiceClient>, ClientError>;
}

pub type SharedAccessor = Arc<dyn ClientAccessor>;

type BuildClient = dyn Fn(&str) -> Result<Arc<dyn ServiceClient>, ClientError> + Send + Sync;

/// Accessor creating one client per region on first use
///
/// Clients are immutable once created; lookups only take the read lock.
pub struct RegionalClients {
    build: Box<BuildClient>,
    clients: RwLock<HashMap<String, Arc<dyn ServiceClient>>>,
}

impl RegionalClients {
    pub fn new(
        build: impl Fn(&str) -> Result<Arc<dyn ServiceClient>, ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            build: Box::new(build),
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Regions a client has been created for
    pub async fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self.clients.read().await.keys().cloned().collect();
        regions.sort();
        regions
    }
}

#[async_trait]
impl ClientAccessor for RegionalClients {
    async fn client(&self, region: &str) -> Result<Arc<dyn ServiceClient>, ClientError> {
        if let Some(client) = self.clients.read().await.get(region) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(region) {
            return Ok(client.clone());
        }

        debug!("Creating client for region {}", region);
        let client = (self.build)(region)?;
        clients.insert(region.to_string(), client.clone());
        Ok(client)
    }
}
