use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

pub mod history_entry;
pub mod stream_event;
pub mod user_status;

pub use history_entry::{HistoryCandidate, HistoryEntry};
pub use stream_event::StreamEvent;
pub use user_status::{UsageQuota, UserStatus};

/// Languages the backend can generate tests for
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SupportedLanguage {
    Python,
    Javascript,
    Java,
}

impl SupportedLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedLanguage::Python => "python",
            SupportedLanguage::Javascript => "javascript",
            SupportedLanguage::Java => "java",
        }
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedLanguage {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python" => Ok(SupportedLanguage::Python),
            "javascript" => Ok(SupportedLanguage::Javascript),
            "java" => Ok(SupportedLanguage::Java),
            other => Err(AppError::ValidationError(format!(
                "Unsupported language: {}",
                other
            ))),
        }
    }
}

/// Body of `POST /api/generate`; immutable once submitted
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GenerateRequest {
    pub input_code: String,
    pub language: SupportedLanguage,
    pub model: String,
    pub turnstile_token: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_regenerate: bool,
}

/// History item as the server returns it from `GET /api/history`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RemoteHistoryItem {
    pub id: String,
    pub input_code: String,
    pub generated_code: String,
    pub language: SupportedLanguage,
    #[serde(default)]
    pub model: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Body of `POST /api/execute`: run generated tests against the input code
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExecuteRequest {
    pub code: String,
    pub test_code: String,
    pub language: SupportedLanguage,
}

/// Outcome of running generated tests in the server's isolated worker
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TestExecutionResult {
    pub success: bool,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub error: Option<String>,
}
