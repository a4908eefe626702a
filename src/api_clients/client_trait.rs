use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::error::AppResult;
use crate::models::{ExecuteRequest, GenerateRequest, RemoteHistoryItem, TestExecutionResult, UserStatus};

/// Raw body fragments as the HTTP layer delivers them. Fragment boundaries
/// are arbitrary; reassembly is the stream decoder's job.
pub type ByteStream = Pin<Box<dyn Stream<Item = AppResult<Bytes>> + Send>>;

/// Transport to the TestGen server. The generation session and the history
/// store depend on this trait, never on a concrete HTTP client, so tests can
/// script responses without a network.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Submit a generation request and return the response body stream.
    ///
    /// An accepted request yields the `text/event-stream` body; a rejected
    /// one (non-2xx, or the in-band JSON validation failure the server sends
    /// with a 200) is mapped to an error before any stream is returned.
    async fn submit_generation(
        &self,
        request: &GenerateRequest,
        access_token: &str,
    ) -> AppResult<ByteStream>;

    /// Fetch the server-side generation history, newest first
    async fn fetch_history(&self, access_token: &str) -> AppResult<Vec<RemoteHistoryItem>>;

    /// Fetch the user's quota/usage status
    async fn fetch_user_status(&self, access_token: &str) -> AppResult<UserStatus>;

    /// Run generated tests against the input code in the server's worker
    async fn execute_test(
        &self,
        request: &ExecuteRequest,
        access_token: &str,
    ) -> AppResult<TestExecutionResult>;
}
