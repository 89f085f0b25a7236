use serde::{Deserialize, Serialize};
use statcore_model::{FiveGamemodes, Tags};

/// The JSON shape stored in `stats.player_data`: everything about a snapshot
/// except its identity columns (`uuid`, `queried_at`, `db_id`), which live in
/// their own columns for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct StoredPayload {
    pub experience: i64,
    pub five_gamemodes: FiveGamemodes,
    pub nickname: Option<String>,
    pub tags: Option<Tags>,
}
