//! Lazily resolved, cached AWS credentials

use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_types::region::Region;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use super::error::ClientError;

/// Credentials are refreshed this long before they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Credentials shared by every client of the process
///
/// The default provider chain (environment, shared config files with an
/// optional profile, SSO, container and instance metadata) is only
/// consulted on first use, so the server starts without credentials.
#[derive(Debug)]
pub struct CredentialsCache {
    profile: Option<String>,
    provider: OnceCell<Arc<dyn ProvideCredentials>>,
    cached: RwLock<Option<Credentials>>,
}

impl CredentialsCache {
    /// Resolve credentials from the default chain, optionally for a named profile
    pub fn from_default_chain(profile: Option<String>) -> Self {
        Self {
            profile,
            provider: OnceCell::new(),
            cached: RwLock::new(None),
        }
    }

    /// Resolve credentials from a specific provider
    pub fn from_provider(provider: Arc<dyn ProvideCredentials>) -> Self {
        Self {
            profile: None,
            provider: OnceCell::new_with(Some(provider)),
            cached: RwLock::new(None),
        }
    }

    /// Current credentials, refreshed when close to expiry
    pub async fn get(&self) -> Result<Credentials, ClientError> {
        if let Some(credentials) = self.cached.read().await.as_ref() {
            if !expires_soon(credentials) {
                return Ok(credentials.clone());
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(credentials) = cached.as_ref() {
            if !expires_soon(credentials) {
                return Ok(credentials.clone());
            }
        }

        let provider = self
            .provider
            .get_or_try_init(|| self.load_default_chain())
            .await?;

        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|e| ClientError::Credentials(e.to_string()))?;
        debug!("Resolved AWS credentials (expiry: {:?})", credentials.expiry());

        *cached = Some(credentials.clone());
        Ok(credentials)
    }

    async fn load_default_chain(&self) -> Result<Arc<dyn ProvideCredentials>, ClientError> {
        // Credentials are region independent; the loader only needs some region
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new("us-east-1"));

        if let Some(profile) = &self.profile {
            info!("Using AWS profile {}", profile);
            loader = loader.profile_name(profile);
        }

        let config = loader.load().await;

        config
            .credentials_provider()
            .map(|provider| Arc::new(provider) as Arc<dyn ProvideCredentials>)
            .ok_or_else(|| {
                ClientError::Credentials(
                    "no credentials provider found; configure credentials via environment \
                     variables, ~/.aws/credentials, SSO or an IAM role"
                        .to_string(),
                )
            })
    }
}

fn expires_soon(credentials: &Credentials) -> bool {
    match credentials.expiry() {
        Some(expiry) => expiry
            .duration_since(SystemTime::now())
            .map(|remaining| remaining < REFRESH_MARGIN)
            .unwrap_or(true),
        None => false,
    }
}
