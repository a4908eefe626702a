use log::info;
use std::sync::Arc;
use std::time::Duration;

use crate::api_clients::{GenerationTransport, ServerApiClient};
use crate::auth::{CredentialProvider, KeyringTokenStorage, TokenManager};
use crate::config::ClientConfig;
use crate::error::AppResult;
use crate::generation::GenerationSession;
use crate::services::{HistoryStore, LocalHistoryStore, UsageRefreshHook};

/// Initialize logging for binaries and examples embedding this crate.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .try_init();
}

/// Token manager persisting the credential through the OS keychain
pub fn keyring_token_manager() -> TokenManager {
    TokenManager::with_storage(Arc::new(KeyringTokenStorage::new()))
}

/// The fully wired client core. Everything is explicitly constructed here;
/// no component reaches for process-wide state.
pub struct ClientServices {
    pub config: ClientConfig,
    pub token_manager: Arc<TokenManager>,
    pub transport: Arc<ServerApiClient>,
    pub history: Arc<LocalHistoryStore>,
    pub usage: Arc<UsageRefreshHook>,
    pub session: Arc<GenerationSession>,
}

/// Build the service graph with an in-memory token manager
pub async fn build_services(config: ClientConfig) -> AppResult<ClientServices> {
    build_services_with_tokens(config, TokenManager::new()).await
}

/// Build the service graph around a caller-supplied token manager, e.g.
/// [`keyring_token_manager`] for deployments with a usable keychain
pub async fn build_services_with_tokens(
    config: ClientConfig,
    token_manager: TokenManager,
) -> AppResult<ClientServices> {
    let token_manager = Arc::new(token_manager);
    let transport = Arc::new(ServerApiClient::new(&config)?);
    let transport_dyn: Arc<dyn GenerationTransport> = transport.clone();
    let credentials: Arc<dyn CredentialProvider> = token_manager.clone();

    let history = match &config.history_cache_path {
        Some(path) => {
            Arc::new(
                LocalHistoryStore::with_cache_file(
                    transport_dyn.clone(),
                    config.max_history_items,
                    path.clone(),
                )
                .await,
            )
        }
        None => Arc::new(LocalHistoryStore::new(
            transport_dyn.clone(),
            config.max_history_items,
        )),
    };
    let history_dyn: Arc<dyn HistoryStore> = history.clone();

    let usage = Arc::new(UsageRefreshHook::new(
        transport_dyn.clone(),
        credentials.clone(),
    ));

    let session = Arc::new(
        GenerationSession::new(transport_dyn, credentials, history_dyn)
            .with_completion_hook(usage.clone())
            .with_idle_read_timeout(Duration::from_secs(config.idle_read_timeout_secs)),
    );

    info!("Client services wired against {}", config.server_url);

    Ok(ClientServices {
        config,
        token_manager,
        transport,
        history,
        usage,
        session,
    })
}
