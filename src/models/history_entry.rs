use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{RemoteHistoryItem, SupportedLanguage};

/// A completed generation retained for review and replay
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub input_code: String,
    pub result_code: String,
    pub language: SupportedLanguage,
    pub created_at: DateTime<Utc>,
}

/// Entry candidate built by the session on successful completion.
/// The store assigns the id and timestamp when it accepts the candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryCandidate {
    pub input_code: String,
    pub result_code: String,
    pub language: SupportedLanguage,
}

impl From<RemoteHistoryItem> for HistoryEntry {
    fn from(item: RemoteHistoryItem) -> Self {
        Self {
            id: item.id,
            input_code: item.input_code,
            result_code: item.generated_code,
            language: item.language,
            created_at: item.created_at,
        }
    }
}
