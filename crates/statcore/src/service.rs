//! `StatsService`: the thin composition layer wiring the cache, rate
//! limiter, identity pipeline, persistence, and query crates into the six
//! public operations named in §2's data flow (`get_account_by_name`,
//! `get_account_by_uuid`, `get_player`, `get_history`, `get_sessions`,
//! `find_milestones`), plus the player-ingestion pipeline (§4.4).

use crate::config::Config;
use chrono::{DateTime, Utc};
use statcore_cache::Cache;
use statcore_core::{BoxedReporter, Clock, CoreError, SystemClock};
use statcore_identity::IdentityService;
use statcore_model::{Account, Gamemode, PlayerSnapshot, Session};
use statcore_persistence::{AccountRepository, PlayerRepository, UserRepository};
use statcore_provider::{IdentityProvider, PlayerProvider, TagProvider};
use statcore_query::{find_milestones, get_history, get_sessions, Achievement, Stat};
use statcore_ratelimiter::{Bound, Outcome, RequestLimiter};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Floor under every player-stats/tag-provider round trip (§4.2's
/// `MinOperationTime` bound). Not derived from `Config`: the design spec
/// ties this bound to the *operation*, not to the admission budget, so it's
/// a fixed constant the same way the identity path's 5-second deadline is.
const ENRICHMENT_MIN_OPERATION_TIME: StdDuration = StdDuration::from_millis(150);

/// Grace period a detached write-back gets after the inbound request that
/// triggered it has already returned or been cancelled (§5, §9).
const DETACHED_STORE_TIMEOUT: StdDuration = StdDuration::from_secs(1);

pub struct StatsService {
    identity: IdentityService,
    cache_player: Cache<String, PlayerSnapshot>,
    limiter_player: RequestLimiter,
    limiter_tags: RequestLimiter,
    player_provider: Arc<dyn PlayerProvider>,
    tag_provider: Arc<dyn TagProvider>,
    player_repo: Arc<dyn PlayerRepository>,
    user_repo: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    reporter: BoxedReporter,
}

impl StatsService {
    /// Wires a service from already-constructed collaborators. Host
    /// processes that want the default `reqwest`/`sqlx` stack should use
    /// [`StatsService::connect`] instead.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &Config,
        identity_provider: Arc<dyn IdentityProvider>,
        player_provider: Arc<dyn PlayerProvider>,
        tag_provider: Arc<dyn TagProvider>,
        account_repo: Arc<dyn AccountRepository>,
        player_repo: Arc<dyn PlayerRepository>,
        user_repo: Arc<dyn UserRepository>,
        reporter: BoxedReporter,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let identity_limiter = RequestLimiter::new(
            config.identity_rate_limit.max_ops,
            config.identity_rate_limit.window,
        );
        let identity = IdentityService::new(
            config.cache_ttl.account_by_name,
            config.cache_ttl.account_by_uuid,
            identity_limiter,
            account_repo,
            identity_provider,
            Arc::clone(&clock),
            Arc::clone(&reporter),
            config.environment,
        );

        Self {
            identity,
            cache_player: Cache::with_ttl(config.cache_ttl.player),
            limiter_player: RequestLimiter::new(
                config.enrichment_rate_limit.max_ops,
                config.enrichment_rate_limit.window,
            ),
            limiter_tags: RequestLimiter::new(
                config.enrichment_rate_limit.max_ops,
                config.enrichment_rate_limit.window,
            ),
            player_provider,
            tag_provider,
            player_repo,
            user_repo,
            clock,
            reporter,
        }
    }

    /// Builds the default `reqwest`/`sqlx`-backed stack from `config` and
    /// wires it into a [`StatsService`]. Connects the database pool and
    /// applies the schema (`statcore_persistence::schema::create_all`) as a
    /// side effect.
    pub async fn connect(config: &Config, reporter: BoxedReporter) -> Result<Self, CoreError> {
        let pool =
            statcore_persistence::connect(&config.database_dsn, config.database_max_connections)
                .await
                .map_err(|err| CoreError::internal(err))?;

        let identity_provider: Arc<dyn IdentityProvider> = Arc::new(
            statcore_provider::HttpIdentityProvider::new(
                config.provider_base_url.clone(),
                &config.user_agent,
            )?,
        );
        let player_provider: Arc<dyn PlayerProvider> = Arc::new(
            statcore_provider::HttpPlayerProvider::new(
                config.provider_base_url.clone(),
                &config.user_agent,
            )?,
        );
        let tag_provider: Arc<dyn TagProvider> = Arc::new(statcore_provider::HttpTagProvider::new(
            config.tag_provider_base_url.clone(),
            config.tag_provider_api_key.clone(),
            &config.user_agent,
        )?);

        let account_repo: Arc<dyn AccountRepository> =
            Arc::new(statcore_persistence::SqlxAccountRepository::new(pool.clone()));
        let player_repo: Arc<dyn PlayerRepository> =
            Arc::new(statcore_persistence::SqlxPlayerRepository::new(pool.clone()));
        let user_repo: Arc<dyn UserRepository> =
            Arc::new(statcore_persistence::SqlxUserRepository::new(pool));

        Ok(Self::new(
            config,
            identity_provider,
            player_provider,
            tag_provider,
            account_repo,
            player_repo,
            user_repo,
            reporter,
        ))
    }

    pub async fn get_account_by_name(
        &self,
        username: &str,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError> {
        self.identity.get_account_by_name(username, cancellation).await
    }

    pub async fn get_account_by_uuid(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError> {
        self.identity.get_account_by_uuid(uuid, cancellation).await
    }

    pub async fn get_player(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<PlayerSnapshot, CoreError> {
        let normalized = statcore_model::normalize_uuid(uuid)
            .map_err(|err| CoreError::invalid_input(err.to_string()))?;
        let key = normalized.clone();
        let (snapshot, _created) = self
            .cache_player
            .get_or_create(cancellation, key, || self.produce_player(normalized, cancellation))
            .await?;
        Ok(snapshot)
    }

    async fn produce_player(
        &self,
        uuid: String,
        cancellation: &CancellationToken,
    ) -> Result<PlayerSnapshot, CoreError> {
        let provider = Arc::clone(&self.player_provider);
        let uuid_for_fetch = uuid.clone();
        let outcome = self
            .limiter_player
            .limit(
                cancellation,
                Bound::MinOperationTime(ENRICHMENT_MIN_OPERATION_TIME),
                || {
                    let provider = Arc::clone(&provider);
                    let uuid = uuid_for_fetch.clone();
                    let cancellation = cancellation.clone();
                    async move { provider.fetch_player(&uuid, &cancellation).await }
                },
            )
            .await
            .map_err(CoreError::from)?;

        let Outcome::Ran(result) = outcome else {
            return Err(CoreError::TemporarilyUnavailable);
        };
        let mut snapshot = result?;

        snapshot.tags = self.fetch_tags_best_effort(&uuid, cancellation).await;

        self.spawn_detached_store(snapshot.clone());
        Ok(snapshot)
    }

    /// Enriches with cheating/sniping tags (§6). A tag-provider failure
    /// never fails the enclosing `get_player` read — it's reported and the
    /// snapshot is returned without tags (§7: best-effort operations log
    /// rather than propagate).
    async fn fetch_tags_best_effort(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Option<statcore_model::Tags> {
        let provider = Arc::clone(&self.tag_provider);
        let uuid_owned = uuid.to_string();
        let outcome = self
            .limiter_tags
            .limit(
                cancellation,
                Bound::MinOperationTime(ENRICHMENT_MIN_OPERATION_TIME),
                || {
                    let provider = Arc::clone(&provider);
                    let uuid = uuid_owned.clone();
                    let cancellation = cancellation.clone();
                    async move { provider.fetch_tags(&uuid, &cancellation).await }
                },
            )
            .await;

        match outcome {
            Ok(Outcome::Ran(Ok(tags))) => Some(tags),
            Ok(Outcome::Ran(Err(err))) => {
                self.note_enrichment_error("get_player:fetch_tags", &err);
                None
            }
            Ok(Outcome::Dropped) => None,
            Err(_) => None,
        }
    }

    /// Persists a successfully-fetched snapshot on a task detached from the
    /// caller's cancellation, wrapped in its own short timeout, so a client
    /// disconnect does not lose the write (§5, §9).
    fn spawn_detached_store(&self, snapshot: PlayerSnapshot) {
        let repo = Arc::clone(&self.player_repo);
        let reporter = Arc::clone(&self.reporter);
        let now = self.clock.now();
        tokio::spawn(async move {
            let result = tokio::time::timeout(
                DETACHED_STORE_TIMEOUT,
                repo.store_player(snapshot, now),
            )
            .await;
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    statcore_core::telemetry::report_if_warranted(
                        reporter.as_ref(),
                        &err,
                        &[("context", "get_player:store_player".to_string())],
                    );
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    warn!("detached store_player timed out after {DETACHED_STORE_TIMEOUT:?}");
                }
            }
        });
    }

    fn note_enrichment_error(&self, context: &'static str, err: &CoreError) {
        statcore_core::telemetry::report_if_warranted(
            self.reporter.as_ref(),
            err,
            &[("context", context.to_string())],
        );
    }

    /// Records (or refreshes) an inbound caller in the append-once `users`
    /// ledger (§3). Not one of the six cached query operations — callers
    /// invoke this directly from the request-handling layer.
    pub async fn touch_user(&self, user_id: &str) -> Result<(), CoreError> {
        self.user_repo.touch(user_id, self.clock.now()).await
    }

    pub async fn get_history(
        &self,
        uuid: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PlayerSnapshot>, CoreError> {
        let normalized = statcore_model::normalize_uuid(uuid)
            .map_err(|err| CoreError::invalid_input(err.to_string()))?;
        get_history(self.player_repo.as_ref(), &normalized, start, end, limit).await
    }

    pub async fn get_sessions(
        &self,
        uuid: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>, CoreError> {
        let normalized = statcore_model::normalize_uuid(uuid)
            .map_err(|err| CoreError::invalid_input(err.to_string()))?;
        get_sessions(self.player_repo.as_ref(), &normalized, start, end).await
    }

    pub async fn find_milestones(
        &self,
        uuid: &str,
        gamemode: Gamemode,
        stat: Stat,
        milestones: &[i64],
    ) -> Result<Vec<Achievement>, CoreError> {
        let normalized = statcore_model::normalize_uuid(uuid)
            .map_err(|err| CoreError::invalid_input(err.to_string()))?;
        find_milestones(self.player_repo.as_ref(), &normalized, gamemode, stat, milestones).await
    }
}
