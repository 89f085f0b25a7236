use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resolved username/uuid pair (§3). Created on first provider lookup,
/// refreshed on every successful provider lookup, removed when the provider
/// reports the username no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Normalized, hyphenated, lowercase uuid.
    pub uuid: String,
    /// Case as returned by the provider; equality elsewhere in the system is
    /// case-insensitive on this field.
    pub username: String,
    pub queried_at: DateTime<Utc>,
}

impl Account {
    pub fn new(uuid: impl Into<String>, username: impl Into<String>, queried_at: DateTime<Utc>) -> Self {
        Self {
            uuid: uuid.into(),
            username: username.into(),
            queried_at,
        }
    }

    /// Age relative to `now`, used by the staleness-tier checks in the
    /// identity pipeline (§4.3).
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.queried_at
    }
}
