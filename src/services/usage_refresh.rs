use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api_clients::GenerationTransport;
use crate::auth::CredentialProvider;
use crate::generation::CompletionHook;
use crate::models::UserStatus;

/// Post-completion hook that pulls fresh quota/usage numbers from the
/// server after every successful generation and caches the latest snapshot
/// for readers. Refresh failures are logged and swallowed; nothing in the
/// generation flow depends on them.
pub struct UsageRefreshHook {
    transport: Arc<dyn GenerationTransport>,
    credentials: Arc<dyn CredentialProvider>,
    latest: RwLock<Option<UserStatus>>,
}

impl UsageRefreshHook {
    pub fn new(
        transport: Arc<dyn GenerationTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            transport,
            credentials,
            latest: RwLock::new(None),
        }
    }

    /// Most recently fetched status, if any refresh has succeeded
    pub async fn latest(&self) -> Option<UserStatus> {
        self.latest.read().await.clone()
    }
}

#[async_trait]
impl CompletionHook for UsageRefreshHook {
    async fn on_generation_complete(&self) {
        let Some(token) = self.credentials.access_token().await else {
            debug!("Skipping usage refresh: no active credential");
            return;
        };

        match self.transport.fetch_user_status(&token).await {
            Ok(status) => {
                debug!(
                    "Usage refreshed: {}/{} used",
                    status.quota.used, status.quota.limit
                );
                *self.latest.write().await = Some(status);
            }
            Err(e) => warn!("Failed to refresh usage after generation: {}", e),
        }
    }
}
