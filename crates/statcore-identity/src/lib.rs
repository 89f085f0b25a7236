//! The by-name/by-uuid account resolution pipelines (§4.3): cache-first,
//! falling back to the local repository, falling back to the upstream
//! identity provider, with staleness-tiered degraded fallback on provider
//! failure and write-back on success.

use chrono::{DateTime, Utc};
use statcore_cache::Cache;
use statcore_core::{BoxedReporter, Clock, CoreError, Environment};
use statcore_model::Account;
use statcore_persistence::AccountRepository;
use statcore_provider::IdentityProvider;
use statcore_ratelimiter::{Bound, Outcome, RequestLimiter};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Prefer a local repo hit over a provider round-trip if it's younger than
/// this (by-username only; the by-uuid path has no preemptive repo read).
const USERNAME_PREFER_REPO_AGE_DAYS: i64 = 10;
/// On provider failure, a by-username repo hit this young is still an
/// acceptable degraded answer.
const USERNAME_DEGRADED_FALLBACK_AGE_DAYS: i64 = 37;
/// On provider failure, a by-uuid repo hit this young is still an acceptable
/// degraded answer.
const UUID_DEGRADED_FALLBACK_AGE_DAYS: i64 = 30;
/// Deadline for a single provider lookup, enforced by the rate limiter
/// (§4.3).
const PROVIDER_DEADLINE: StdDuration = StdDuration::from_secs(5);

pub struct IdentityService {
    cache_by_name: Cache<String, Account>,
    cache_by_uuid: Cache<String, Account>,
    limiter: RequestLimiter,
    repo: Arc<dyn AccountRepository>,
    provider: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    reporter: BoxedReporter,
    environment: Environment,
}

impl IdentityService {
    /// `cache_ttl_by_name`/`cache_ttl_by_uuid` let the host tune the two
    /// named caches independently (§6's per-named-cache `cache_ttl`
    /// configuration) even though they share a producer pipeline.
    pub fn new(
        cache_ttl_by_name: StdDuration,
        cache_ttl_by_uuid: StdDuration,
        limiter: RequestLimiter,
        repo: Arc<dyn AccountRepository>,
        provider: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        reporter: BoxedReporter,
        environment: Environment,
    ) -> Self {
        Self {
            cache_by_name: Cache::with_ttl(cache_ttl_by_name),
            cache_by_uuid: Cache::with_ttl(cache_ttl_by_uuid),
            limiter,
            repo,
            provider,
            clock,
            reporter,
            environment,
        }
    }

    /// Reports a repo read/write error per the `environment` toggle (§4.3):
    /// `Production` reports it as `Internal` even though the enclosing read
    /// may still succeed via a fallback tier; `Development` only traces it.
    fn note_repo_error(&self, context: &'static str, err: &CoreError) {
        match self.environment {
            Environment::Production => {
                statcore_core::telemetry::report_if_warranted(
                    self.reporter.as_ref(),
                    err,
                    &[("context", context.to_string())],
                );
            }
            Environment::Development => {
                #[cfg(feature = "tracing")]
                debug!(context, error = %err, "repo error (development, relaxed fallback)");
            }
        }
    }

    pub async fn get_account_by_name(
        &self,
        username: &str,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError> {
        if username.trim().is_empty() {
            return Err(CoreError::invalid_input("username must not be empty"));
        }
        let key = username.to_lowercase();
        let username = username.to_string();
        let (account, _created) = self
            .cache_by_name
            .get_or_create(cancellation, key, || {
                self.produce_by_name(username, cancellation)
            })
            .await?;
        Ok(account)
    }

    pub async fn get_account_by_uuid(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError> {
        let normalized = statcore_model::normalize_uuid(uuid)
            .map_err(|err| CoreError::invalid_input(err.to_string()))?;
        let key = normalized.clone();
        let (account, _created) = self
            .cache_by_uuid
            .get_or_create(cancellation, key, || {
                self.produce_by_uuid(normalized, cancellation)
            })
            .await?;
        Ok(account)
    }

    async fn produce_by_name(
        &self,
        username: String,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError> {
        let now = self.clock.now();
        let repo_hit = match self.repo.get_by_username(&username.to_lowercase()).await {
            Ok(hit) => hit,
            Err(err) => {
                self.note_repo_error("get_account_by_name:repo_read", &err);
                None
            }
        };

        if let Some(account) = &repo_hit {
            if account.age(now).num_days() < USERNAME_PREFER_REPO_AGE_DAYS {
                return Ok(account.clone());
            }
        }

        let provider = Arc::clone(&self.provider);
        let username_for_call = username.clone();
        let outcome = self
            .limiter
            .limit(cancellation, Bound::MaxOperationTime(PROVIDER_DEADLINE), || {
                let provider = Arc::clone(&provider);
                let username = username_for_call.clone();
                let cancellation = cancellation.clone();
                async move { provider.lookup_by_name(&username, &cancellation).await }
            })
            .await
            .map_err(CoreError::from)?;

        let result = match outcome {
            Outcome::Ran(result) => result,
            Outcome::Dropped => return Err(CoreError::TemporarilyUnavailable),
        };

        match result {
            Err(CoreError::NotFound) => {
                if let Err(err) = self.repo.delete_by_username(&username.to_lowercase()).await {
                    self.note_repo_error("get_account_by_name:delete", &err);
                }
                Err(CoreError::NotFound)
            }
            Err(err) => {
                if let Some(account) = repo_hit {
                    if account.age(now).num_days() < USERNAME_DEGRADED_FALLBACK_AGE_DAYS {
                        return Ok(account);
                    }
                }
                Err(err)
            }
            Ok(account) => {
                if let Err(err) = self.repo.store(&account).await {
                    self.note_repo_error("get_account_by_name:store", &err);
                }
                Ok(account)
            }
        }
    }

    async fn produce_by_uuid(
        &self,
        uuid: String,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError> {
        let now = self.clock.now();
        let provider = Arc::clone(&self.provider);
        let uuid_for_call = uuid.clone();
        let outcome = self
            .limiter
            .limit(cancellation, Bound::MaxOperationTime(PROVIDER_DEADLINE), || {
                let provider = Arc::clone(&provider);
                let uuid = uuid_for_call.clone();
                let cancellation = cancellation.clone();
                async move { provider.lookup_by_uuid(&uuid, &cancellation).await }
            })
            .await
            .map_err(CoreError::from)?;

        let result = match outcome {
            Outcome::Ran(result) => result,
            Outcome::Dropped => return Err(CoreError::TemporarilyUnavailable),
        };

        match result {
            Err(CoreError::NotFound) => Err(CoreError::NotFound),
            Err(err) => {
                let repo_hit = match self.repo.get_by_uuid(&uuid).await {
                    Ok(hit) => hit,
                    Err(repo_err) => {
                        self.note_repo_error("get_account_by_uuid:repo_read", &repo_err);
                        None
                    }
                };
                if let Some(account) = repo_hit {
                    if account.age(now).num_days() < UUID_DEGRADED_FALLBACK_AGE_DAYS {
                        return Ok(account);
                    }
                }
                Err(err)
            }
            Ok(account) => {
                if let Err(err) = self.repo.store(&account).await {
                    self.note_repo_error("get_account_by_uuid:store", &err);
                }
                Ok(account)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use statcore_core::{Clock, NoopReporter};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedClock(DateTime<Utc>);
    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct FakeRepo {
        accounts: Mutex<std::collections::HashMap<String, Account>>,
    }

    #[async_trait]
    impl AccountRepository for FakeRepo {
        async fn get_by_username(&self, username_lower: &str) -> Result<Option<Account>, CoreError> {
            Ok(self
                .accounts
                .lock()
                .unwrap()
                .values()
                .find(|a| a.username.to_lowercase() == username_lower)
                .cloned())
        }
        async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Account>, CoreError> {
            Ok(self.accounts.lock().unwrap().get(uuid).cloned())
        }
        async fn store(&self, account: &Account) -> Result<(), CoreError> {
            self.accounts
                .lock()
                .unwrap()
                .insert(account.uuid.clone(), account.clone());
            Ok(())
        }
        async fn delete_by_username(&self, username_lower: &str) -> Result<(), CoreError> {
            self.accounts
                .lock()
                .unwrap()
                .retain(|_, v| v.username.to_lowercase() != username_lower);
            Ok(())
        }
    }

    struct FakeProvider {
        calls: AtomicUsize,
        behavior: Box<dyn Fn() -> Result<Account, CoreError> + Send + Sync>,
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn lookup_by_uuid(
            &self,
            _uuid: &str,
            _cancellation: &CancellationToken,
        ) -> Result<Account, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.behavior)()
        }
        async fn lookup_by_name(
            &self,
            _username: &str,
            _cancellation: &CancellationToken,
        ) -> Result<Account, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.behavior)()
        }
    }

    fn service(
        repo: Arc<FakeRepo>,
        provider: Arc<FakeProvider>,
        now: DateTime<Utc>,
    ) -> IdentityService {
        IdentityService::new(
            StdDuration::from_secs(60),
            StdDuration::from_secs(60),
            RequestLimiter::new(1000, StdDuration::from_secs(1)),
            repo,
            provider,
            Arc::new(FixedClock(now)),
            Arc::new(NoopReporter),
            Environment::Production,
        )
    }

    #[tokio::test]
    async fn provider_success_writes_back_and_returns() {
        let now = Utc::now();
        let repo = Arc::new(FakeRepo {
            accounts: Mutex::new(Default::default()),
        });
        let account = Account::new("11111111-1111-1111-1111-111111111111", "Notch", now);
        let account2 = account.clone();
        let provider = Arc::new(FakeProvider {
            calls: AtomicUsize::new(0),
            behavior: Box::new(move || Ok(account2.clone())),
        });

        let svc = service(Arc::clone(&repo), Arc::clone(&provider), now);
        let token = CancellationToken::new();
        let got = svc.get_account_by_name("Notch", &token).await.unwrap();
        assert_eq!(got.uuid, account.uuid);
        assert!(repo.get_by_uuid(&account.uuid).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn degraded_fallback_returns_repo_hit_on_provider_error() {
        let now = Utc::now();
        let stale_but_acceptable = now - chrono::Duration::days(20);
        let account = Account::new(
            "22222222-2222-2222-2222-222222222222",
            "Herobrine",
            stale_but_acceptable,
        );
        let mut accounts = std::collections::HashMap::new();
        accounts.insert(account.uuid.clone(), account.clone());
        let repo = Arc::new(FakeRepo {
            accounts: Mutex::new(accounts),
        });
        let provider = Arc::new(FakeProvider {
            calls: AtomicUsize::new(0),
            behavior: Box::new(|| {
                Err(CoreError::internal(anyhow::anyhow!("transport error")))
            }),
        });

        let svc = service(repo, provider, now);
        let token = CancellationToken::new();
        let got = svc
            .get_account_by_name("Herobrine", &token)
            .await
            .unwrap();
        assert_eq!(got.username, "Herobrine");
    }

    #[tokio::test]
    async fn too_stale_repo_hit_surfaces_the_provider_error() {
        let now = Utc::now();
        let too_stale = now - chrono::Duration::days(40);
        let account = Account::new(
            "33333333-3333-3333-3333-333333333333",
            "Dream",
            too_stale,
        );
        let mut accounts = std::collections::HashMap::new();
        accounts.insert(account.uuid.clone(), account.clone());
        let repo = Arc::new(FakeRepo {
            accounts: Mutex::new(accounts),
        });
        let provider = Arc::new(FakeProvider {
            calls: AtomicUsize::new(0),
            behavior: Box::new(|| {
                Err(CoreError::internal(anyhow::anyhow!("transport error")))
            }),
        });

        let svc = service(repo, provider, now);
        let token = CancellationToken::new();
        let err = svc
            .get_account_by_name("Dream", &token)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Internal(_)));
    }

    #[tokio::test]
    async fn not_found_deletes_the_repo_entry() {
        let now = Utc::now();
        let account = Account::new(
            "44444444-4444-4444-4444-444444444444",
            "Gone",
            now - chrono::Duration::days(50),
        );
        let mut accounts = std::collections::HashMap::new();
        accounts.insert(account.uuid.clone(), account.clone());
        let repo = Arc::new(FakeRepo {
            accounts: Mutex::new(accounts),
        });
        let provider = Arc::new(FakeProvider {
            calls: AtomicUsize::new(0),
            behavior: Box::new(|| Err(CoreError::NotFound)),
        });

        let svc = service(Arc::clone(&repo), provider, now);
        let token = CancellationToken::new();
        let err = svc.get_account_by_name("Gone", &token).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound));
        assert!(repo.get_by_username("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_uuid_input_is_rejected_before_any_network_call() {
        let now = Utc::now();
        let repo = Arc::new(FakeRepo {
            accounts: Mutex::new(Default::default()),
        });
        let provider = Arc::new(FakeProvider {
            calls: AtomicUsize::new(0),
            behavior: Box::new(|| Err(CoreError::NotFound)),
        });
        let svc = service(Arc::clone(&repo), Arc::clone(&provider), now);
        let token = CancellationToken::new();
        let err = svc.get_account_by_uuid("not-a-uuid", &token).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
