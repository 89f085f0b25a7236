use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-once, update-on-revisit caller record (§3, `users` table in §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub seen_count: i64,
}

impl User {
    pub fn first_seen(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            first_seen_at: now,
            last_seen_at: now,
            seen_count: 1,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen_at = now;
        self.seen_count += 1;
    }
}
