//! Domain types for the stats-aggregation core: accounts, player snapshots,
//! sessions, tags, and the uuid normalization every identity path depends on
//! (§3).

mod account;
mod player;
mod session;
mod tags;
mod user;
mod uuid_fmt;

pub use account::Account;
pub use player::{FiveGamemodes, Gamemode, GamemodeStats, PlayerSnapshot};
pub use session::Session;
pub use tags::{TagSeverity, Tags};
pub use user::User;
pub use uuid_fmt::{normalize_uuid, UuidFormatError};
