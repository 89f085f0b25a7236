//! Portable DDL for the three logical tables (§6). Kept as plain `TEXT`/
//! `BIGINT` columns rather than Postgres-only types (`JSONB`, native
//! timestamps) so the same statements run against Postgres in production and
//! an in-memory SQLite database in tests, behind `sqlx`'s `Any` driver.
//! Timestamps are stored as Unix milliseconds; uuids and JSON payloads as
//! `TEXT`.

pub const CREATE_STATS: &str = r#"
CREATE TABLE IF NOT EXISTS stats (
    id TEXT PRIMARY KEY,
    player_uuid TEXT NOT NULL,
    queried_at BIGINT NOT NULL,
    data_format_version BIGINT NOT NULL,
    player_data TEXT NOT NULL
)
"#;

pub const CREATE_STATS_INDEX_UUID_TIME: &str =
    "CREATE INDEX IF NOT EXISTS idx_stats_uuid_queried_at ON stats (player_uuid, queried_at)";

pub const CREATE_STATS_INDEX_ID_UUID_TIME: &str =
    "CREATE INDEX IF NOT EXISTS idx_stats_id_uuid_queried_at ON stats (id, player_uuid, queried_at)";

pub const CREATE_USERNAMES: &str = r#"
CREATE TABLE IF NOT EXISTS usernames (
    player_uuid TEXT PRIMARY KEY,
    username TEXT NOT NULL,
    username_lower TEXT NOT NULL UNIQUE,
    queried_at BIGINT NOT NULL
)
"#;

pub const CREATE_USERNAME_QUERIES: &str = r#"
CREATE TABLE IF NOT EXISTS username_queries (
    player_uuid TEXT NOT NULL,
    username TEXT NOT NULL,
    last_queried_at BIGINT NOT NULL
)
"#;

pub const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    first_seen_at BIGINT NOT NULL,
    last_seen_at BIGINT NOT NULL,
    seen_count BIGINT NOT NULL
)
"#;

/// Applies every `CREATE TABLE IF NOT EXISTS` statement. Migration
/// versioning beyond this is the caller's job (§1, Non-goals).
pub async fn create_all(pool: &sqlx::AnyPool) -> Result<(), sqlx::Error> {
    for statement in [
        CREATE_STATS,
        CREATE_STATS_INDEX_UUID_TIME,
        CREATE_STATS_INDEX_ID_UUID_TIME,
        CREATE_USERNAMES,
        CREATE_USERNAME_QUERIES,
        CREATE_USERS,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
