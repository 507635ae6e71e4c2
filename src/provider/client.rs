//! HTTP client for the provider's catalog API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::auth::{AuthError, TokenManager};
use super::models::{
    ArtistsResponse, AudioFeatures, AudioFeaturesResponse, ProviderArtist, SavedTracksPage,
};
use super::retry_policy::RetryPolicy;
use crate::config::ProviderSettings;
use crate::server::metrics;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Provider GET {path} failed with status {status}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("Provider GET {path} failed: {message}")]
    Transport { path: String, message: String },

    #[error("Invalid provider response for {path}: {message}")]
    Decode { path: String, message: String },
}

impl ProviderError {
    /// Transport failures, rate limiting and server errors are transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Transport { .. } => true,
            ProviderError::Auth(_) | ProviderError::Decode { .. } => false,
        }
    }
}

/// The catalog endpoints the import pipeline reads from.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /me/tracks?limit=&offset=`
    async fn saved_tracks_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<SavedTracksPage, ProviderError>;

    /// `GET /audio-features?ids=`. Entries the provider has no data for are `None`.
    async fn audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, ProviderError>;

    /// `GET /artists?ids=`
    async fn artists(&self, ids: &[String]) -> Result<Vec<Option<ProviderArtist>>, ProviderError>;
}

struct FailedAttempt {
    error: ProviderError,
    retry_after: Option<Duration>,
}

impl From<ProviderError> for FailedAttempt {
    fn from(error: ProviderError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

pub struct ProviderClient {
    http: reqwest::Client,
    api_url: String,
    tokens: Arc<TokenManager>,
    retry: RetryPolicy,
}

impl ProviderClient {
    pub fn new(
        settings: &ProviderSettings,
        tokens: Arc<TokenManager>,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ProviderError::Transport {
                path: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            tokens,
            retry: RetryPolicy::new(settings),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// GETs `path` relative to the API root with a bearer token, retrying
    /// transient failures according to the retry policy.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
    ) -> Result<T, ProviderError> {
        let mut retries_done = 0;
        loop {
            match self.get_once(endpoint, path).await {
                Ok(value) => return Ok(value),
                Err(failed) => {
                    if !self.retry.should_retry(&failed.error, retries_done) {
                        return Err(failed.error);
                    }
                    let delay = self.retry.delay_for(retries_done, failed.retry_after);
                    warn!(
                        "{} (retry {}/{} in {}ms)",
                        failed.error,
                        retries_done + 1,
                        self.retry.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    retries_done += 1;
                }
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
    ) -> Result<T, FailedAttempt> {
        let token = self.tokens.ensure_valid_token().await.map_err(ProviderError::from)?;
        let url = format!("{}{}", self.api_url, path);
        debug!("GET {}", url);

        let response = match self.http.get(&url).bearer_auth(token).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_provider_request(endpoint, "error");
                return Err(ProviderError::Transport {
                    path: path.to_string(),
                    message: e.to_string(),
                }
                .into());
            }
        };

        let status = response.status();
        metrics::record_provider_request(endpoint, status.as_str());

        if !status.is_success() {
            let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
                response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
            } else {
                None
            };
            let body = response.text().await.unwrap_or_default();
            return Err(FailedAttempt {
                error: ProviderError::Status {
                    status: status.as_u16(),
                    path: path.to_string(),
                    body,
                },
                retry_after,
            });
        }

        response.json::<T>().await.map_err(|e| {
            ProviderError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl CatalogApi for ProviderClient {
    async fn saved_tracks_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<SavedTracksPage, ProviderError> {
        let path = format!("/me/tracks?limit={}&offset={}", limit, offset);
        self.get_json("saved_tracks", &path).await
    }

    async fn audio_features(
        &self,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, ProviderError> {
        let path = format!("/audio-features?ids={}", ids.join(","));
        let response: AudioFeaturesResponse = self.get_json("audio_features", &path).await?;
        Ok(response.audio_features)
    }

    async fn artists(&self, ids: &[String]) -> Result<Vec<Option<ProviderArtist>>, ProviderError> {
        let path = format!("/artists?ids={}", ids.join(","));
        let response: ArtistsResponse = self.get_json("artists", &path).await?;
        Ok(response.artists)
    }
}
