use serde::{Deserialize, Serialize};

/// A single decoded event from the generation stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental fragment of generated text
    Chunk { content: String },
    /// Terminal failure reported by the server mid-stream
    Error {
        message: String,
        code: Option<String>,
    },
    /// Terminal success signal
    Done,
    /// Payload that was not valid JSON; consumers treat it like a chunk
    RawText { content: String },
}

impl StreamEvent {
    /// No further events are meaningful for a stream after a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Error { .. } | StreamEvent::Done)
    }

    /// Text to append to the accumulated result, if this event carries any
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Chunk { content } | StreamEvent::RawText { content } => Some(content),
            _ => None,
        }
    }
}
