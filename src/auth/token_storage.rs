use async_trait::async_trait;
use keyring::Entry;
use tokio::task;

use crate::constants::{KEYRING_SERVICE, TOKEN_KEY};
use crate::error::{AppError, AppResult};

/// Durable backend for the access token. Implementations must tolerate the
/// token being absent.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn load(&self) -> AppResult<Option<String>>;
    async fn save(&self, token: &str) -> AppResult<()>;
    async fn delete(&self) -> AppResult<()>;
}

/// Token storage backed by the OS keychain. Keyring calls are blocking, so
/// they run off the async runtime.
#[derive(Debug, Clone)]
pub struct KeyringTokenStorage {
    service: String,
    account: String,
}

impl KeyringTokenStorage {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
            account: TOKEN_KEY.to_string(),
        }
    }

    fn entry(service: &str, account: &str) -> AppResult<Entry> {
        Entry::new(service, account).map_err(|e| AppError::KeyringError(e.to_string()))
    }
}

impl Default for KeyringTokenStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStorage for KeyringTokenStorage {
    async fn load(&self) -> AppResult<Option<String>> {
        let (service, account) = (self.service.clone(), self.account.clone());
        task::spawn_blocking(move || {
            let entry = Self::entry(&service, &account)?;
            match entry.get_password() {
                Ok(token) => Ok(Some(token)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(AppError::KeyringError(e.to_string())),
            }
        })
        .await
        .map_err(|e| AppError::InternalError(format!("Keyring task failed: {}", e)))?
    }

    async fn save(&self, token: &str) -> AppResult<()> {
        let (service, account) = (self.service.clone(), self.account.clone());
        let token = token.to_string();
        task::spawn_blocking(move || {
            let entry = Self::entry(&service, &account)?;
            entry
                .set_password(&token)
                .map_err(|e| AppError::KeyringError(e.to_string()))
        })
        .await
        .map_err(|e| AppError::InternalError(format!("Keyring task failed: {}", e)))?
    }

    async fn delete(&self) -> AppResult<()> {
        let (service, account) = (self.service.clone(), self.account.clone());
        task::spawn_blocking(move || {
            let entry = Self::entry(&service, &account)?;
            match entry.delete_credential() {
                // Deleting an absent token is not a failure
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(AppError::KeyringError(e.to_string())),
            }
        })
        .await
        .map_err(|e| AppError::InternalError(format!("Keyring task failed: {}", e)))?
    }
}
