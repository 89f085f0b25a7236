//! `sqlx`-backed repositories for the three logical tables of §6, behind the
//! `Any` driver so the same queries run against Postgres in production and
//! an in-memory SQLite database in tests.

mod payload;
mod pool;
mod repository;
pub mod schema;
mod sqlx_account;
mod sqlx_player;
mod sqlx_user;
mod time;

pub use pool::{connect, connect_test};
pub use repository::{AccountRepository, PlayerRepository, UserRepository};
pub use sqlx_account::SqlxAccountRepository;
pub use sqlx_player::SqlxPlayerRepository;
pub use sqlx_user::SqlxUserRepository;
