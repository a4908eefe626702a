use serde::Serialize;
use tokio::sync::broadcast;

use crate::constants::SESSION_EVENT_CAPACITY;

/// Lifecycle notifications published by a generation session.
/// `ResultDelta` fires after every append so a UI can render text as it
/// streams in.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Started,
    ResultDelta { content: String },
    Completed,
    Failed {
        message: String,
        code: Option<String>,
    },
    Reset,
}

/// Fan-out channel for session events. Subscribers observe only; they never
/// mutate session state.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is not an error
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(SESSION_EVENT_CAPACITY)
    }
}
