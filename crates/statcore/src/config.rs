//! The typed configuration this core accepts (§6). Loading it from the
//! environment/a config file is the host process's job; this core only
//! defines the shape.

use statcore_core::Environment;
use std::time::Duration;

/// Admission bounds for a single rate-limited upstream (§4.2).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_ops: usize,
}

impl RateLimitConfig {
    pub fn new(max_ops: usize, window: Duration) -> Self {
        Self { window, max_ops }
    }
}

/// `cache_ttl` per named cache (§6): account-by-name, account-by-uuid, and
/// the player-snapshot read-through cache this expansion adds for
/// `get_player`.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtlConfig {
    pub account_by_name: Duration,
    pub account_by_uuid: Duration,
    pub player: Duration,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            account_by_name: Duration::from_secs(300),
            account_by_uuid: Duration::from_secs(300),
            player: Duration::from_secs(60),
        }
    }
}

/// Every option the core recognizes (§6). The enclosing process is
/// responsible for loading these from a config file or environment
/// variables; this core only consumes the typed result.
#[derive(Debug, Clone)]
pub struct Config {
    /// Toggles relaxed fallbacks vs strict error reporting in the identity
    /// pipeline (§4.3).
    pub environment: Environment,
    pub database_dsn: String,
    /// Logical schema name, if the backend distinguishes one. Not consulted
    /// by the portable `Any`-driver DDL in `statcore-persistence::schema`
    /// (Postgres callers may still use it to scope a `search_path`).
    pub database_schema: String,
    pub database_max_connections: u32,
    pub identity_rate_limit: RateLimitConfig,
    /// Shared between the player-stats and tag-provider upstreams: both are
    /// "third-party enrichment" calls under the `MinOperationTime` bound
    /// (§4.2), so one admission budget governs both.
    pub enrichment_rate_limit: RateLimitConfig,
    pub provider_base_url: String,
    pub tag_provider_base_url: String,
    pub tag_provider_api_key: Option<String>,
    pub cache_ttl: CacheTtlConfig,
    pub user_agent: String,
}

impl Config {
    /// A configuration suited to local development: relaxed fallback
    /// behavior and generous rate-limit budgets.
    pub fn development(database_dsn: impl Into<String>) -> Self {
        Self {
            environment: Environment::Development,
            database_dsn: database_dsn.into(),
            database_schema: "public".to_string(),
            database_max_connections: 5,
            identity_rate_limit: RateLimitConfig::new(600, Duration::from_secs(300)),
            enrichment_rate_limit: RateLimitConfig::new(600, Duration::from_secs(300)),
            provider_base_url: "https://api.mojang.com".to_string(),
            tag_provider_base_url: "https://urchin.ws".to_string(),
            tag_provider_api_key: None,
            cache_ttl: CacheTtlConfig::default(),
            user_agent: "statcore/0.1".to_string(),
        }
    }
}
