use serde::{Deserialize, Serialize};

/// Weekly generation quota as reported by `GET /api/user/status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageQuota {
    pub limit: i64,
    pub used: i64,
    pub remaining: i64,
}

/// Subset of the user status payload the client consumes.
/// Unknown fields are ignored so the server can grow the payload freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStatus {
    pub quota: UsageQuota,
}
