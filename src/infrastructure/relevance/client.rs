//! HTTP client for the remote relevance service.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::domain::errors::RelevanceError;
use crate::domain::models::{ActivityId, FetchOutcome, RelevanceRecord, RemoteConfig, UserId};
use crate::domain::ports::RelevanceStore;

/// Body of a successful record read. Extra record fields are ignored.
#[derive(Debug, Deserialize)]
struct RelevanceBody {
    relevant: bool,
}

/// Resolve the service base URL.
///
/// An explicit `base_url` wins. Otherwise the configured service path is joined onto
/// the page origin.
pub fn resolve_base_url(
    config: &RemoteConfig,
    page_origin: Option<&str>,
) -> Result<Url, RelevanceError> {
    if let Some(base) = config.base_url.as_deref() {
        return Url::parse(base).map_err(|e| RelevanceError::InvalidUrl(format!("{base}: {e}")));
    }

    let origin = page_origin.ok_or_else(|| {
        RelevanceError::InvalidUrl("no base URL configured and no page origin known".to_string())
    })?;
    let origin =
        Url::parse(origin).map_err(|e| RelevanceError::InvalidUrl(format!("{origin}: {e}")))?;
    origin
        .join(&config.service_path)
        .map_err(|e| RelevanceError::InvalidUrl(format!("{}: {e}", config.service_path)))
}

/// [`RelevanceStore`] speaking the `/relevance` REST protocol.
///
/// - `GET {base}/relevance/{userId}/{activityId}` answers `200 {"relevant": bool}` or `404`
/// - `POST {base}/relevance` takes `{"userId", "activityId", "relevant"}`
#[derive(Debug, Clone)]
pub struct HttpRelevanceClient {
    http_client: ReqwestClient,
    base_url: Url,
}

impl HttpRelevanceClient {
    /// Create a client for an explicit base URL with the default timeout.
    pub fn new(base_url: &str) -> Result<Self, RelevanceError> {
        let config = RemoteConfig {
            base_url: Some(base_url.to_string()),
            ..RemoteConfig::default()
        };
        Self::with_config(&config, None)
    }

    /// Create a client from configuration, falling back to the page origin for the base.
    pub fn with_config(
        config: &RemoteConfig,
        page_origin: Option<&str>,
    ) -> Result<Self, RelevanceError> {
        let base_url = resolve_base_url(config, page_origin)?;
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, RelevanceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RelevanceError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn status_error(response: reqwest::Response) -> RelevanceError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());
        warn!(status = %status, body = %body, "relevance service error");
        RelevanceError::Status {
            status: status.as_u16(),
            body,
        }
    }
}

#[async_trait]
impl RelevanceStore for HttpRelevanceClient {
    #[instrument(skip_all, fields(user_id = %user_id, activity_id = %activity_id))]
    async fn fetch_state(
        &self,
        user_id: &UserId,
        activity_id: &ActivityId,
    ) -> Result<FetchOutcome, RelevanceError> {
        let url = self.endpoint(["relevance", user_id.as_str(), activity_id.as_str()])?;
        let response = self.http_client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("no relevance record yet");
                Ok(FetchOutcome::NotFound)
            }
            status if status.is_success() => {
                let body: RelevanceBody = response.json().await?;
                debug!(relevant = body.relevant, "relevance record fetched");
                Ok(FetchOutcome::Found {
                    relevant: body.relevant,
                })
            }
            _ => Err(Self::status_error(response).await),
        }
    }

    #[instrument(skip_all, fields(user_id = %user_id, activity_id = %activity_id, relevant = relevant))]
    async fn push_state(
        &self,
        user_id: &UserId,
        activity_id: &ActivityId,
        relevant: bool,
    ) -> Result<(), RelevanceError> {
        let url = self.endpoint(["relevance"])?;
        let record = RelevanceRecord::new(user_id.clone(), activity_id.clone(), relevant);
        let response = self.http_client.post(url).json(&record).send().await?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        debug!("relevance record pushed");
        Ok(())
    }
}
