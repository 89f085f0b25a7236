use crate::status::map_identity_status;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use statcore_core::CoreError;
use statcore_model::{FiveGamemodes, GamemodeStats, PlayerSnapshot};
use tokio_util::sync::CancellationToken;

/// Fetches a player's current stats from the upstream provider. Unlike
/// [`crate::IdentityProvider`] and [`crate::TagProvider`], the wire shape of
/// this endpoint is not pinned by the design spec (only the identity and tag
/// provider shapes are, §6) — `HttpPlayerProvider` assumes the same host
/// serves stats under `/player/{uuid}`, mirroring the identity provider's
/// path convention. Hosts with a different stats endpoint should supply
/// their own [`PlayerProvider`] implementation instead.
#[async_trait]
pub trait PlayerProvider: Send + Sync {
    async fn fetch_player(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<PlayerSnapshot, CoreError>;
}

#[derive(Debug, Deserialize)]
struct BedwarsResponse {
    #[serde(default)]
    experience: i64,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    solo: GamemodeStats,
    #[serde(default)]
    doubles: GamemodeStats,
    #[serde(default)]
    threes: GamemodeStats,
    #[serde(default)]
    fours: GamemodeStats,
    #[serde(default)]
    overall: GamemodeStats,
}

/// `reqwest`-backed [`PlayerProvider`]. Shares the identity provider's
/// status-code mapping (§6): `404`/`204` means the player has no recorded
/// stats, `429`/`503`/`504` is a transient upstream failure.
pub struct HttpPlayerProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlayerProvider {
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
}

#[async_trait]
impl PlayerProvider for HttpPlayerProvider {
    async fn fetch_player(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<PlayerSnapshot, CoreError> {
        let request = self
            .client
            .get(format!("{}/player/{uuid}", self.base_url))
            .send();
        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(CoreError::Cancelled),
            result = request => result.map_err(|err| CoreError::internal(err))?,
        };

        if !response.status().is_success() {
            return Err(map_identity_status(response.status()));
        }

        let body: BedwarsResponse = response
            .json()
            .await
            .map_err(|err| CoreError::internal(err))?;

        Ok(PlayerSnapshot {
            db_id: None,
            uuid: uuid.to_string(),
            queried_at: Utc::now(),
            experience: body.experience,
            five_gamemodes: FiveGamemodes {
                solo: body.solo,
                doubles: body.doubles,
                threes: body.threes,
                fours: body.fours,
                overall: body.overall,
            },
            nickname: body.nickname,
            tags: None,
        })
    }
}
