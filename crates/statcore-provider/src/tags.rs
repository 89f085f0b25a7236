use async_trait::async_trait;
use serde::Deserialize;
use statcore_core::CoreError;
use statcore_model::{TagSeverity, Tags};
use tokio_util::sync::CancellationToken;

/// The upstream tag provider: cheating/sniping community reports (§6).
#[async_trait]
pub trait TagProvider: Send + Sync {
    async fn fetch_tags(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<Tags, CoreError>;
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[allow(dead_code)]
    uuid: String,
    tags: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(rename = "type")]
    kind: String,
}

/// Maps a single tag-provider report type to its sniping/cheating severity
/// contribution (§6). `info`/`caution`/`account` are metric-only and
/// contribute nothing.
fn severity_for(kind: &str) -> (TagSeverity, TagSeverity) {
    match kind {
        "possible_sniper" => (TagSeverity::Medium, TagSeverity::Medium),
        "sniper" => (TagSeverity::High, TagSeverity::Medium),
        "legit_sniper" => (TagSeverity::High, TagSeverity::None),
        "closet_cheater" => (TagSeverity::None, TagSeverity::Medium),
        "blatant_cheater" | "confirmed_cheater" => (TagSeverity::None, TagSeverity::High),
        _ => (TagSeverity::None, TagSeverity::None),
    }
}

fn tags_from_entries(entries: &[TagEntry]) -> Tags {
    entries
        .iter()
        .map(|entry| severity_for(&entry.kind))
        .fold(Tags::default(), |acc, (sniping, cheating)| {
            acc.combine(Tags { cheating, sniping })
        })
}

/// `reqwest`-backed [`TagProvider`]. `api_key`, if set, is appended as a query
/// parameter; an auth failure (`401`/`403`, or a body of `"Invalid Key"` when
/// a key is configured) surfaces as `CoreError::InvalidApiKey` (§6).
pub struct HttpTagProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTagProvider {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, user_agent: &str) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .map_err(|err| CoreError::internal(err))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl TagProvider for HttpTagProvider {
    async fn fetch_tags(
        &self,
        uuid: &str,
        cancellation: &CancellationToken,
    ) -> Result<Tags, CoreError> {
        let mut request = self
            .client
            .get(format!("{}/player/{uuid}", self.base_url))
            .query(&[("sources", "MANUAL")]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(CoreError::Cancelled),
            result = request.send() => result.map_err(|err| CoreError::internal(err))?,
        };

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(CoreError::InvalidApiKey);
        }

        let body = response.text().await.map_err(|err| CoreError::internal(err))?;
        if self.api_key.is_some() && body == "\"Invalid Key\"" {
            return Err(CoreError::InvalidApiKey);
        }
        if !status.is_success() {
            return Err(CoreError::internal(anyhow::anyhow!(
                "tag provider returned {status}"
            )));
        }

        let parsed: TagsResponse =
            serde_json::from_str(&body).map_err(|err| CoreError::internal(err))?;
        Ok(tags_from_entries(&parsed.tags))
    }
}
