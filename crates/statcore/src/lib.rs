//! The stats-aggregation service facade.
//!
//! This crate is a thin composition layer: it owns no algorithms of its own
//! beyond wiring `statcore-cache`, `statcore-ratelimiter`,
//! `statcore-identity`, `statcore-persistence`, `statcore-provider`, and
//! `statcore-query` into [`StatsService`], the six public operations named
//! in the design spec's data flow (§2), and the player-ingestion pipeline
//! (§4.4).

mod config;
mod service;

pub use config::{CacheTtlConfig, Config, RateLimitConfig};
pub use service::StatsService;

pub use statcore_core::{CoreError, Environment};
pub use statcore_model::{
    Account, FiveGamemodes, Gamemode, GamemodeStats, PlayerSnapshot, Session, TagSeverity, Tags,
    User,
};
pub use statcore_query::{exp_to_stars, stars_to_exp, Achievement, Stat};
