use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api_clients::GenerationTransport;
use crate::error::AppResult;
use crate::models::{HistoryCandidate, HistoryEntry};

/// Capped, newest-first record of completed generations.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Accept a candidate from a finished session; assigns id and timestamp.
    /// When the store is full the least-recently-added entry is evicted.
    async fn add_entry(&self, candidate: HistoryCandidate) -> AppResult<()>;

    /// Current entries, newest first
    async fn entries(&self) -> Vec<HistoryEntry>;

    /// Replace the local collection with the server's copy. A failed fetch
    /// leaves the local cache exactly as it was.
    async fn refresh_from_remote(&self, access_token: &str) -> AppResult<usize>;

    /// Drop all local entries (logout)
    async fn clear(&self);
}

/// In-memory history with an optional offline JSON cache. The cache mirrors
/// the collection after every mutation; cache write failures are logged and
/// otherwise ignored so history keeps working without a writable disk.
pub struct LocalHistoryStore {
    transport: Arc<dyn GenerationTransport>,
    entries: RwLock<VecDeque<HistoryEntry>>,
    capacity: usize,
    cache_path: Option<PathBuf>,
}

impl LocalHistoryStore {
    pub fn new(transport: Arc<dyn GenerationTransport>, capacity: usize) -> Self {
        Self {
            transport,
            entries: RwLock::new(VecDeque::new()),
            capacity,
            cache_path: None,
        }
    }

    /// Like [`new`](Self::new), seeded from the cache file when one exists
    pub async fn with_cache_file(
        transport: Arc<dyn GenerationTransport>,
        capacity: usize,
        cache_path: PathBuf,
    ) -> Self {
        let mut cached = Self::load_cache(&cache_path).await;
        cached.truncate(capacity);

        Self {
            transport,
            entries: RwLock::new(cached),
            capacity,
            cache_path: Some(cache_path),
        }
    }

    async fn load_cache(path: &Path) -> VecDeque<HistoryEntry> {
        match tokio::fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice::<VecDeque<HistoryEntry>>(&bytes) {
                Ok(entries) => {
                    debug!("Loaded {} history entries from {:?}", entries.len(), path);
                    entries
                }
                Err(e) => {
                    warn!("Ignoring unreadable history cache {:?}: {}", path, e);
                    VecDeque::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VecDeque::new(),
            Err(e) => {
                warn!("Failed to read history cache {:?}: {}", path, e);
                VecDeque::new()
            }
        }
    }

    async fn persist(&self, entries: &VecDeque<HistoryEntry>) {
        let Some(path) = &self.cache_path else {
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                warn!("Failed to create history cache directory {:?}: {}", parent, e);
                return;
            }
        }

        match serde_json::to_vec(entries) {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(path, bytes).await {
                    warn!("Failed to write history cache {:?}: {}", path, e);
                }
            }
            Err(e) => warn!("Failed to serialize history cache: {}", e),
        }
    }
}

#[async_trait]
impl HistoryStore for LocalHistoryStore {
    async fn add_entry(&self, candidate: HistoryCandidate) -> AppResult<()> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            input_code: candidate.input_code,
            result_code: candidate.result_code,
            language: candidate.language,
            created_at: Utc::now(),
        };

        let mut entries = self.entries.write().await;
        entries.push_front(entry);
        while entries.len() > self.capacity {
            // Eviction is FIFO by insertion order: the back of the deque is
            // always the least-recently-added entry present
            entries.pop_back();
        }
        self.persist(&entries).await;
        Ok(())
    }

    async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    async fn refresh_from_remote(&self, access_token: &str) -> AppResult<usize> {
        // Propagating the error before touching `entries` is what keeps the
        // cache intact when the server is unreachable
        let remote = self.transport.fetch_history(access_token).await?;

        let mut refreshed: VecDeque<HistoryEntry> =
            remote.into_iter().map(HistoryEntry::from).collect();
        refreshed.truncate(self.capacity);

        let mut entries = self.entries.write().await;
        *entries = refreshed;
        self.persist(&entries).await;
        Ok(entries.len())
    }

    async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.persist(&entries).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_clients::ByteStream;
    use crate::error::AppError;
    use crate::models::{
        ExecuteRequest, GenerateRequest, RemoteHistoryItem, SupportedLanguage, TestExecutionResult,
        UserStatus,
    };
    use pretty_assertions::assert_eq;

    struct ScriptedTransport {
        history: AppResult<Vec<RemoteHistoryItem>>,
    }

    impl ScriptedTransport {
        fn offline() -> Arc<Self> {
            Arc::new(Self {
                history: Err(AppError::HttpError("connection refused".to_string())),
            })
        }

        fn with_history(items: Vec<RemoteHistoryItem>) -> Arc<Self> {
            Arc::new(Self { history: Ok(items) })
        }
    }

    #[async_trait]
    impl GenerationTransport for ScriptedTransport {
        async fn submit_generation(
            &self,
            _request: &GenerateRequest,
            _access_token: &str,
        ) -> AppResult<ByteStream> {
            Err(AppError::InternalError("not scripted".to_string()))
        }

        async fn fetch_history(&self, _access_token: &str) -> AppResult<Vec<RemoteHistoryItem>> {
            self.history.clone()
        }

        async fn fetch_user_status(&self, _access_token: &str) -> AppResult<UserStatus> {
            Ok(UserStatus::default())
        }

        async fn execute_test(
            &self,
            _request: &ExecuteRequest,
            _access_token: &str,
        ) -> AppResult<TestExecutionResult> {
            Err(AppError::InternalError("not scripted".to_string()))
        }
    }

    fn candidate(tag: &str) -> HistoryCandidate {
        HistoryCandidate {
            input_code: format!("input-{}", tag),
            result_code: format!("result-{}", tag),
            language: SupportedLanguage::Python,
        }
    }

    fn remote_item(id: &str) -> RemoteHistoryItem {
        RemoteHistoryItem {
            id: id.to_string(),
            input_code: format!("input-{}", id),
            generated_code: format!("generated-{}", id),
            language: SupportedLanguage::Javascript,
            model: Some("gemini-3-flash-preview".to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn keeps_entries_newest_first() {
        let store = LocalHistoryStore::new(ScriptedTransport::offline(), 10);
        store.add_entry(candidate("a")).await.unwrap();
        store.add_entry(candidate("b")).await.unwrap();

        let entries = store.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].input_code, "input-b");
        assert_eq!(entries[1].input_code, "input-a");
    }

    #[tokio::test]
    async fn evicts_the_first_added_entry_once_over_capacity() {
        let store = LocalHistoryStore::new(ScriptedTransport::offline(), 3);
        for tag in ["a", "b", "c", "d"] {
            store.add_entry(candidate(tag)).await.unwrap();
        }

        let entries = store.entries().await;
        assert_eq!(entries.len(), 3);
        let inputs: Vec<&str> = entries.iter().map(|e| e.input_code.as_str()).collect();
        assert_eq!(inputs, vec!["input-d", "input-c", "input-b"]);
    }

    #[tokio::test]
    async fn failed_refresh_leaves_local_cache_untouched() {
        let store = LocalHistoryStore::new(ScriptedTransport::offline(), 10);
        store.add_entry(candidate("local")).await.unwrap();

        let result = store.refresh_from_remote("token").await;
        assert!(result.is_err());

        let entries = store.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].input_code, "input-local");
    }

    #[tokio::test]
    async fn successful_refresh_replaces_local_entries() {
        let transport = ScriptedTransport::with_history(vec![remote_item("r1"), remote_item("r2")]);
        let store = LocalHistoryStore::new(transport, 10);
        store.add_entry(candidate("stale")).await.unwrap();

        let count = store.refresh_from_remote("token").await.unwrap();
        assert_eq!(count, 2);

        let entries = store.entries().await;
        assert_eq!(entries[0].id, "r1");
        assert_eq!(entries[0].result_code, "generated-r1");
        assert_eq!(entries[1].id, "r2");
    }

    #[tokio::test]
    async fn persists_and_reloads_entries_through_the_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("history.json");

        {
            let store = LocalHistoryStore::with_cache_file(
                ScriptedTransport::offline(),
                10,
                cache_path.clone(),
            )
            .await;
            store.add_entry(candidate("persisted")).await.unwrap();
        }

        let reloaded =
            LocalHistoryStore::with_cache_file(ScriptedTransport::offline(), 10, cache_path).await;
        let entries = reloaded.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].input_code, "input-persisted");
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = LocalHistoryStore::new(ScriptedTransport::offline(), 10);
        store.add_entry(candidate("a")).await.unwrap();
        store.clear().await;
        assert!(store.entries().await.is_empty());
    }
}
