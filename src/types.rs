use serde::{Deserialize, Serialize};

// Rate limit metadata lifted from response headers; logged, never printed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct RateMeta {
    pub limit: Option<i64>,
    pub remaining: Option<i64>,
    pub reset_at: Option<String>,
}

impl RateMeta {
    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.remaining.is_none() && self.reset_at.is_none()
    }
}

/// Lenient typed view of the key-status body, used only by `--summary`.
/// The default output path never goes through these types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KeyStatus {
    #[serde(default)]
    pub data: KeyInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KeyInfo {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub usage: Option<f64>,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub limit_remaining: Option<f64>,
    #[serde(default)]
    pub is_free_tier: Option<bool>,
    #[serde(default)]
    pub rate_limit: Option<KeyRateLimit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct KeyRateLimit {
    #[serde(default)]
    pub requests: Option<i64>,
    #[serde(default)]
    pub interval: Option<String>,
}

impl KeyInfo {
    /// Remaining credit: the server's figure when present, else limit minus usage.
    /// `None` means the key has no limit.
    pub fn remaining(&self) -> Option<f64> {
        if self.limit_remaining.is_some() {
            return self.limit_remaining;
        }
        let limit = self.limit?;
        Some(limit - self.usage.unwrap_or(0.0))
    }
}
