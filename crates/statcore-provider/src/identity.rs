use crate::status::map_identity_status;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use statcore_core::CoreError;
use statcore_model::{normalize_uuid, Account};
use tokio_util::sync::CancellationToken;

/// The upstream identity provider: uuid ⇄ username lookups (§6).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn lookup_by_uuid(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError>;

    async fn lookup_by_name(
        &self,
        username: &str,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError>;
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    id: String,
    name: String,
}

/// `reqwest`-backed [`IdentityProvider`]. The user-agent header is set once
/// on the client builder, not per-request (§6).
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|err| CoreError::internal(err))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get(
        &self,
        path: String,
        cancellation: &CancellationToken,
    ) -> Result<ProfileResponse, CoreError> {
        let request = self.client.get(path).send();
        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(CoreError::Cancelled),
            result = request => result.map_err(|err| CoreError::internal(err))?,
        };

        if !response.status().is_success() {
            return Err(map_identity_status(response.status()));
        }

        response
            .json::<ProfileResponse>()
            .await
            .map_err(|err| CoreError::internal(err))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn lookup_by_uuid(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError> {
        let path = format!("{}/minecraft/profile/lookup/{uuid}", self.base_url);
        let profile = self.get(path, cancellation).await?;
        let normalized = normalize_uuid(&profile.id)
            .map_err(|err| CoreError::invalid_input(err.to_string()))?;
        Ok(Account::new(normalized, profile.name, Utc::now()))
    }

    async fn lookup_by_name(
        &self,
        username: &str,
        cancellation: &CancellationToken,
    ) -> Result<Account, CoreError> {
        let path = format!("{}/minecraft/profile/lookup/name/{username}", self.base_url);
        let profile = self.get(path, cancellation).await?;
        let normalized = normalize_uuid(&profile.id)
            .map_err(|err| CoreError::invalid_input(err.to_string()))?;
        Ok(Account::new(normalized, profile.name, Utc::now()))
    }
}
