//! Provider account linking and the import trigger.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiResult;
use super::state::{GuardedOAuthClient, GuardedTokenManager, ServerState};
use crate::error::ValidationError;
use crate::provider::{AuthError, AuthStatus};

#[derive(Deserialize, Debug)]
struct CallbackParams {
    code: Option<String>,
    /// Set by the provider when the user declines access.
    error: Option<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct ImportResponse {
    message: String,
    count: usize,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

async fn login(State(oauth): State<GuardedOAuthClient>) -> impl IntoResponse {
    Redirect::to(&oauth.authorize_url())
}

async fn callback(
    State(tokens): State<GuardedTokenManager>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Json<MessageResponse>> {
    if let Some(error) = params.error {
        return Err(AuthError::AuthorizationDenied(error).into());
    }
    let code = params
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ValidationError::new("Missing code"))?;

    tokens.exchange_code(&code).await?;
    Ok(Json(MessageResponse {
        message: "Provider account linked. Now call POST /api/spotify/import".to_string(),
    }))
}

async fn import(State(state): State<ServerState>) -> ApiResult<Json<ImportResponse>> {
    let cancel = state.shutdown.child_token();
    let summary = state.importer.run(&cancel).await?;
    info!(
        "Import {} wrote {} tracks ({} bytes)",
        summary.run_id, summary.tracks, summary.document_bytes
    );
    Ok(Json(ImportResponse {
        message: "Imported to triple store".to_string(),
        count: summary.tracks,
    }))
}

async fn status(State(tokens): State<GuardedTokenManager>) -> Json<StatusResponse> {
    let status = match tokens.status().await {
        AuthStatus::Unauthenticated => "unauthenticated",
        AuthStatus::Authorized => "authorized",
        AuthStatus::Expiring => "expiring",
    };
    Json(StatusResponse { status })
}

pub fn make_spotify_routes(state: ServerState) -> Router {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/import", post(import))
        .route("/status", get(status))
        .with_state(state)
}
