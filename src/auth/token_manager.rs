use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::CredentialProvider;
use super::token_storage::TokenStorage;

/// In-memory credential cell with optional write-through persistence.
/// Without a storage backend, tokens live only for the process lifetime.
pub struct TokenManager {
    token: RwLock<Option<String>>,
    storage: Option<Arc<dyn TokenStorage>>,
}

impl TokenManager {
    pub fn new() -> Self {
        Self {
            token: RwLock::new(None),
            storage: None,
        }
    }

    pub fn with_storage(storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            token: RwLock::new(None),
            storage: Some(storage),
        }
    }

    pub async fn get(&self) -> Option<String> {
        // Write lock so a token loaded from storage can be cached
        let mut token_guard = self.token.write().await;
        if token_guard.is_some() {
            return token_guard.clone();
        }

        if let Some(storage) = &self.storage {
            match storage.load().await {
                Ok(Some(stored_token)) => {
                    *token_guard = Some(stored_token.clone());
                    info!("TokenManager: Loaded token from storage.");
                    return Some(stored_token);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        "TokenManager: Failed to load token from storage: {}. Operating in-memory for this session.",
                        e
                    );
                }
            }
        }
        None
    }

    pub async fn set(&self, new_token: Option<String>) {
        let mut token_guard = self.token.write().await;
        *token_guard = new_token.clone();

        if let Some(storage) = &self.storage {
            match new_token {
                Some(token_to_store) => {
                    if let Err(e) = storage.save(&token_to_store).await {
                        warn!(
                            "TokenManager: Failed to persist token: {}. Token only stored in memory.",
                            e
                        );
                    }
                }
                None => {
                    if let Err(e) = storage.delete().await {
                        warn!(
                            "TokenManager: Failed to remove persisted token: {}. Token only cleared from memory.",
                            e
                        );
                    }
                }
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.get().await.is_some()
    }
}

impl Default for TokenManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for TokenManager {
    async fn access_token(&self) -> Option<String> {
        self.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStorage {
        stored: Mutex<Option<String>>,
    }

    #[async_trait]
    impl TokenStorage for MemoryStorage {
        async fn load(&self) -> AppResult<Option<String>> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save(&self, token: &str) -> AppResult<()> {
            *self.stored.lock().unwrap() = Some(token.to_string());
            Ok(())
        }

        async fn delete(&self) -> AppResult<()> {
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    #[tokio::test]
    async fn starts_without_a_credential() {
        let manager = TokenManager::new();
        assert_eq!(manager.get().await, None);
        assert!(!manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn set_and_get_round_trip_in_memory() {
        let manager = TokenManager::new();
        manager.set(Some("jwt-abc".to_string())).await;
        assert_eq!(manager.get().await, Some("jwt-abc".to_string()));

        manager.set(None).await;
        assert_eq!(manager.get().await, None);
    }

    #[tokio::test]
    async fn loads_token_from_storage_on_first_read() {
        let storage = Arc::new(MemoryStorage::default());
        *storage.stored.lock().unwrap() = Some("persisted".to_string());

        let manager = TokenManager::with_storage(storage);
        assert_eq!(manager.get().await, Some("persisted".to_string()));
    }

    #[tokio::test]
    async fn set_writes_through_to_storage() {
        let storage = Arc::new(MemoryStorage::default());
        let manager = TokenManager::with_storage(storage.clone());

        manager.set(Some("fresh".to_string())).await;
        assert_eq!(*storage.stored.lock().unwrap(), Some("fresh".to_string()));

        manager.set(None).await;
        assert_eq!(*storage.stored.lock().unwrap(), None);
    }
}
