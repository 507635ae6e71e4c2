//! OAuth token lifecycle for the music provider.
//!
//! This module handles the provider's OAuth 2.0 flow:
//! - Authorization URL generation for the `/login` redirect
//! - Token exchange (authorization code for access + refresh tokens)
//! - Token refresh with a single in-flight network call
//!
//! `TokenManager` is the only piece of shared mutable state in the import
//! pipeline. Its lock is held across the refresh request, so callers that
//! arrive while a refresh is running wait for it and then read the fresh
//! token instead of issuing their own refresh.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ProviderSettings;
use crate::server::metrics;

/// Errors from the OAuth layer. All of them require the user to go
/// through `/login` again; none is retried automatically.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Not authorized, complete the login flow first")]
    NotAuthorized,

    #[error("Missing authorization code")]
    MissingCode,

    #[error("Authorization denied by provider: {0}")]
    AuthorizationDenied(String),

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("Token request failed: {0}")]
    Transport(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

/// Fields consumed from the provider's token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Optional on refresh, in which case the previous refresh token stays valid.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Remaining lifetime in seconds.
    pub expires_in: u64,
}

/// The two OAuth grants the token manager needs.
#[async_trait]
pub trait TokenGrant: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

/// HTTP client for the provider's accounts service.
pub struct OAuthClient {
    http: reqwest::Client,
    accounts_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl OAuthClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            accounts_url: settings.accounts_url.trim_end_matches('/').to_string(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            scopes: settings.scopes.clone(),
        })
    }

    /// URL the user is redirected to in order to grant access.
    pub fn authorize_url(&self) -> String {
        let scope = self.scopes.join(" ");
        let params = [
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("show_dialog", "true"),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}/authorize?{}", self.accounts_url, query)
    }

    fn basic_auth_header(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(credentials))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let url = format!("{}/api/token", self.accounts_url);
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, self.basic_auth_header())
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl TokenGrant for OAuthClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

#[derive(Debug, Clone)]
struct TokenSet {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Instant,
}

/// Upper bound on the lifetime accepted from the token endpoint.
const MAX_TOKEN_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

impl TokenSet {
    fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        let lifetime_secs = response.expires_in.min(MAX_TOKEN_LIFETIME_SECS);
        let expires_at = Instant::now() + Duration::from_secs(lifetime_secs);
        let wall_clock = chrono::Utc::now() + chrono::Duration::seconds(lifetime_secs as i64);
        debug!("Access token valid until {}", wall_clock.to_rfc3339());
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at,
        }
    }

    fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[derive(Debug)]
enum TokenState {
    Unauthenticated,
    Authorized(TokenSet),
}

/// Externally observable token state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Authorized,
    /// Authorized, but the next `ensure_valid_token` will refresh.
    Expiring,
}

/// Owns the token set and serializes every transition of it.
pub struct TokenManager {
    grant: Arc<dyn TokenGrant>,
    refresh_margin: Duration,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(grant: Arc<dyn TokenGrant>, refresh_margin: Duration) -> Self {
        Self {
            grant,
            refresh_margin,
            state: Mutex::new(TokenState::Unauthenticated),
        }
    }

    /// Exchanges an authorization code for a token set.
    ///
    /// On failure the previous state is left untouched.
    pub async fn exchange_code(&self, code: &str) -> Result<(), AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::MissingCode);
        }

        let mut state = self.state.lock().await;
        let response = self.grant.exchange_code(code).await?;
        if response.refresh_token.is_none() {
            warn!("Authorization code grant returned no refresh token");
        }
        *state = TokenState::Authorized(TokenSet::from_response(response, None));
        info!("Provider account linked");
        Ok(())
    }

    /// Returns an access token with more than the refresh margin of life left,
    /// refreshing it first if needed.
    ///
    /// A failed refresh resets the manager to unauthenticated.
    pub async fn ensure_valid_token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;

        let tokens = match &*state {
            TokenState::Unauthenticated => return Err(AuthError::NotAuthorized),
            TokenState::Authorized(tokens) => tokens,
        };

        if tokens.remaining() > self.refresh_margin {
            return Ok(tokens.access_token.clone());
        }

        let refresh_token = match tokens.refresh_token.clone() {
            Some(token) => token,
            None => {
                *state = TokenState::Unauthenticated;
                metrics::record_token_refresh("failure");
                return Err(AuthError::MissingRefreshToken);
            }
        };

        debug!("Access token expiring, refreshing");
        match self.grant.refresh(&refresh_token).await {
            Ok(response) => {
                let tokens = TokenSet::from_response(response, Some(refresh_token));
                let access_token = tokens.access_token.clone();
                *state = TokenState::Authorized(tokens);
                metrics::record_token_refresh("success");
                info!("Access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                *state = TokenState::Unauthenticated;
                metrics::record_token_refresh("failure");
                warn!("Token refresh failed, re-authorization required: {}", e);
                Err(e)
            }
        }
    }

    pub async fn status(&self) -> AuthStatus {
        match &*self.state.lock().await {
            TokenState::Unauthenticated => AuthStatus::Unauthenticated,
            TokenState::Authorized(tokens) if tokens.remaining() > self.refresh_margin => {
                AuthStatus::Authorized
            }
            TokenState::Authorized(_) => AuthStatus::Expiring,
        }
    }
}
