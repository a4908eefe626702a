use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_IDLE_READ_TIMEOUT_SECS, MAX_HISTORY_ITEMS, SERVER_API_URL, SERVER_URL_ENV,
};

/// Runtime configuration for the client core. Constructed once by the
/// assembly layer and passed down; nothing here is process-global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the TestGen server
    pub server_url: String,
    /// How long a streaming read may sit idle before the attempt fails
    pub idle_read_timeout_secs: u64,
    /// Local history capacity; oldest entries are evicted first
    pub max_history_items: usize,
    /// Offline cache for history; `None` disables persistence
    pub history_cache_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: read_env(SERVER_URL_ENV, SERVER_API_URL),
            idle_read_timeout_secs: DEFAULT_IDLE_READ_TIMEOUT_SECS,
            max_history_items: MAX_HISTORY_ITEMS,
            history_cache_path: default_history_cache_path(),
        }
    }
}

fn read_env(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => {
            debug!("{} not set, using default {}", name, default);
            default.to_string()
        }
    }
}

fn default_history_cache_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("testgen-client").join("history.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let config = ClientConfig::default();
        assert!(!config.server_url.is_empty());
        assert_eq!(config.max_history_items, MAX_HISTORY_ITEMS);
        assert_eq!(config.idle_read_timeout_secs, DEFAULT_IDLE_READ_TIMEOUT_SECS);
    }
}
