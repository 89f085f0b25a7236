use async_trait::async_trait;
use chrono::{DateTime, Utc};
use statcore_core::CoreError;
use statcore_model::{Account, PlayerSnapshot, User};

/// Local persistent view of the account/uuid mapping, consulted by the
/// identity pipeline's staleness-tiered fallback (§4.3).
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn get_by_username(&self, username_lower: &str) -> Result<Option<Account>, CoreError>;
    async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Account>, CoreError>;
    /// Upserts by uuid; on a username collision with a different uuid the
    /// conflicting row is replaced and its prior entry appended to the
    /// `username_queries` audit log (§6).
    async fn store(&self, account: &Account) -> Result<(), CoreError>;
    async fn delete_by_username(&self, username_lower: &str) -> Result<(), CoreError>;
}

/// Time-series player snapshot storage (§4.4) and the raw range reads the
/// query layer builds history/sessions/milestones from.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Applies the recency and consecutive-duplicate guards and inserts if
    /// neither suppresses the write. Returns the stored (or deduplicated-away
    /// equivalent) snapshot, carrying its `db_id` when a row was written.
    async fn store_player(
        &self,
        snapshot: PlayerSnapshot,
        now: DateTime<Utc>,
    ) -> Result<PlayerSnapshot, CoreError>;

    /// All snapshots for `uuid` with `queried_at` in `[start, end]`, ordered
    /// ascending. Used directly by the history sampler and (with caller-side
    /// padding) the session extractor.
    async fn snapshots_in_range(
        &self,
        uuid: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PlayerSnapshot>, CoreError>;

    /// Every snapshot for `uuid`, ascending, with no time bound. Used by the
    /// milestone finder.
    async fn all_snapshots(&self, uuid: &str) -> Result<Vec<PlayerSnapshot>, CoreError>;
}

/// The append-once, update-on-revisit caller ledger (§3, `users` table §6).
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn touch(&self, user_id: &str, now: DateTime<Utc>) -> Result<(), CoreError>;
    async fn get(&self, user_id: &str) -> Result<Option<User>, CoreError>;
}
