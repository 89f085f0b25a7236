use crate::tags::Tags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the five gamemode buckets a snapshot carries stats for (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamemode {
    Solo,
    Doubles,
    Threes,
    Fours,
    Overall,
}

/// Per-gamemode counters. All fields non-negative; `winstreak` is absent when
/// the provider doesn't report it for that gamemode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GamemodeStats {
    pub games_played: i64,
    pub wins: i64,
    pub losses: i64,
    pub beds_broken: i64,
    pub beds_lost: i64,
    pub final_kills: i64,
    pub final_deaths: i64,
    pub kills: i64,
    pub deaths: i64,
    pub winstreak: Option<i64>,
}

/// The five gamemode buckets carried by every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FiveGamemodes {
    pub solo: GamemodeStats,
    pub doubles: GamemodeStats,
    pub threes: GamemodeStats,
    pub fours: GamemodeStats,
    pub overall: GamemodeStats,
}

impl FiveGamemodes {
    pub fn get(&self, gamemode: Gamemode) -> GamemodeStats {
        match gamemode {
            Gamemode::Solo => self.solo,
            Gamemode::Doubles => self.doubles,
            Gamemode::Threes => self.threes,
            Gamemode::Fours => self.fours,
            Gamemode::Overall => self.overall,
        }
    }
}

/// A point-in-time player snapshot (§3). `db_id` is assigned at insert time
/// and is strictly increasing with insertion order (a version-7 uuid, §9);
/// it is `None` until the snapshot has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub db_id: Option<uuid::Uuid>,
    pub uuid: String,
    pub queried_at: DateTime<Utc>,
    pub experience: i64,
    pub five_gamemodes: FiveGamemodes,
    pub nickname: Option<String>,
    pub tags: Option<Tags>,
}

impl PlayerSnapshot {
    /// Structural equality over the fields the dedup guard cares about:
    /// `five_gamemodes` and `experience` (§4.4, §9 — replaces a canonical-JSON
    /// byte comparison with derived `PartialEq` on the deserialized payload).
    pub fn payload_equals(&self, other: &PlayerSnapshot) -> bool {
        self.experience == other.experience && self.five_gamemodes == other.five_gamemodes
    }

    pub fn overall(&self) -> GamemodeStats {
        self.five_gamemodes.overall
    }

    /// Shorthand for `overall().games_played`, the progress counter the
    /// session extractor walks (§4.6).
    pub fn games_played(&self) -> i64 {
        self.five_gamemodes.overall.games_played
    }
}
