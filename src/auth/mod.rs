pub mod token_manager;
pub mod token_storage;

use async_trait::async_trait;

pub use token_manager::TokenManager;
pub use token_storage::{KeyringTokenStorage, TokenStorage};

/// Read side of the credential state. The generation session only needs to
/// know whether a credential is currently available and what it is; login
/// and logout flows live elsewhere.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Option<String>;
}
