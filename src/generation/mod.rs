pub mod session;

use async_trait::async_trait;

pub use session::{GenerationSession, GenerationStatus, SessionSnapshot};

/// Opaque callback invoked once after every successful generation. Used in
/// practice to refresh quota/usage information; the session never consumes
/// a return value from it.
#[async_trait]
pub trait CompletionHook: Send + Sync {
    async fn on_generation_complete(&self);
}
