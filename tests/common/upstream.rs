//! Fake upstream services
//!
//! A single axum app standing in for the provider's accounts service
//! (`/accounts`), its catalog API (`/v1`) and the triple store (`/store`).
//! Every request is recorded so tests can assert on what the server sent.

use super::constants::*;
use super::fixtures;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub method: &'static str,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub query: String,
}

pub struct Upstream {
    pub base_url: String,

    /// `expires_in` of every token response
    pub token_expires_in: AtomicU64,
    pub token_requests: Mutex<Vec<HashMap<String, String>>>,
    pub refresh_count: AtomicUsize,
    current_token: Mutex<Option<String>>,

    /// Every catalog request as `path?query`
    pub catalog_requests: Mutex<Vec<String>>,
    /// Number of saved-tracks requests answered with 503 before succeeding
    pub tracks_failures: AtomicUsize,
    /// Number of saved-tracks requests answered with 429 before succeeding
    pub rate_limits: AtomicUsize,
    pub artists_always_fail: AtomicBool,
    /// Delay before answering each saved-tracks page
    pub tracks_delay_ms: AtomicU64,

    pub uploads: Mutex<Vec<RecordedUpload>>,
    pub upload_status: AtomicU16,
    pub queries: Mutex<Vec<RecordedQuery>>,
    pub select_response: Mutex<Value>,

    shutdown: CancellationToken,
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl Upstream {
    pub async fn spawn() -> Arc<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind upstream port");
        let port = listener
            .local_addr()
            .expect("Failed to get upstream address")
            .port();

        let upstream = Arc::new(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            token_expires_in: AtomicU64::new(3600),
            token_requests: Mutex::new(Vec::new()),
            refresh_count: AtomicUsize::new(0),
            current_token: Mutex::new(None),
            catalog_requests: Mutex::new(Vec::new()),
            tracks_failures: AtomicUsize::new(0),
            rate_limits: AtomicUsize::new(0),
            artists_always_fail: AtomicBool::new(false),
            tracks_delay_ms: AtomicU64::new(0),
            uploads: Mutex::new(Vec::new()),
            upload_status: AtomicU16::new(200),
            queries: Mutex::new(Vec::new()),
            select_response: Mutex::new(fixtures::select_results(&[], &[])),
            shutdown: CancellationToken::new(),
        });

        let app = Router::new()
            .route("/accounts/api/token", post(token))
            .route("/v1/me/tracks", get(saved_tracks))
            .route("/v1/audio-features", get(audio_features))
            .route("/v1/artists", get(artists))
            .route("/store/data", post(store_data))
            .route("/store/query", post(store_query_post).get(store_query_get))
            .with_state(upstream.clone());

        let shutdown = upstream.shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .expect("Upstream failed");
        });

        upstream
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn set_select_response(&self, response: Value) {
        *self.select_response.lock().unwrap() = response;
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn catalog_requests(&self) -> Vec<String> {
        self.catalog_requests.lock().unwrap().clone()
    }

    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let current = self.current_token.lock().unwrap().clone();
        match (current, header_value(headers, header::AUTHORIZATION)) {
            (Some(token), Some(value)) => value == format!("Bearer {}", token),
            _ => false,
        }
    }

    fn record_catalog_request(&self, path: &str, params: &HashMap<String, String>) {
        let mut keys: Vec<_> = params.iter().collect();
        keys.sort();
        let query = keys
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        self.catalog_requests
            .lock()
            .unwrap()
            .push(format!("{}?{}", path, query));
    }

    fn token_response(&self, access_token: &str, refresh_token: Option<&str>) -> Response {
        *self.current_token.lock().unwrap() = Some(access_token.to_string());
        let mut body = json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": self.token_expires_in.load(Ordering::SeqCst),
        });
        if let Some(refresh_token) = refresh_token {
            body["refresh_token"] = json!(refresh_token);
        }
        Json(body).into_response()
    }
}

fn invalid_grant() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "invalid_grant"})),
    )
        .into_response()
}

async fn token(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    upstream.token_requests.lock().unwrap().push(form.clone());

    let expected_auth = format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", CLIENT_ID, CLIENT_SECRET))
    );
    if header_value(&headers, header::AUTHORIZATION).as_deref() != Some(expected_auth.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_client"})),
        )
            .into_response();
    }

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            if form.get("code").map(String::as_str) != Some(AUTH_CODE)
                || form.get("redirect_uri").map(String::as_str) != Some(REDIRECT_URI)
            {
                return invalid_grant();
            }
            upstream.token_response(ACCESS_TOKEN, Some(REFRESH_TOKEN))
        }
        Some("refresh_token") => {
            if form.get("refresh_token").map(String::as_str) != Some(REFRESH_TOKEN) {
                return invalid_grant();
            }
            upstream.refresh_count.fetch_add(1, Ordering::SeqCst);
            // No new refresh token: the previous one stays valid
            upstream.token_response(REFRESHED_ACCESS_TOKEN, None)
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        )
            .into_response(),
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"status": 401, "message": "Invalid access token"}})),
    )
        .into_response()
}

async fn saved_tracks(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.record_catalog_request("/v1/me/tracks", &params);
    if !upstream.is_authorized(&headers) {
        return unauthorized();
    }

    let delay_ms = upstream.tracks_delay_ms.load(Ordering::SeqCst);
    if delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
    }

    if take_one(&upstream.rate_limits) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, "0")],
            "rate limited",
        )
            .into_response();
    }
    if take_one(&upstream.tracks_failures) {
        return (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response();
    }

    let limit = params
        .get("limit")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);
    let offset = params
        .get("offset")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    Json(fixtures::saved_tracks_page(&upstream.base_url, offset, limit)).into_response()
}

fn ids_param(params: &HashMap<String, String>) -> Vec<String> {
    params
        .get("ids")
        .map(|ids| ids.split(',').map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

async fn audio_features(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.record_catalog_request("/v1/audio-features", &params);
    if !upstream.is_authorized(&headers) {
        return unauthorized();
    }
    let ids = ids_param(&params);
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    Json(fixtures::audio_features(&ids)).into_response()
}

async fn artists(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.record_catalog_request("/v1/artists", &params);
    if !upstream.is_authorized(&headers) {
        return unauthorized();
    }
    if upstream.artists_always_fail.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "artists unavailable").into_response();
    }
    let ids = ids_param(&params);
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    Json(fixtures::artists(&ids)).into_response()
}

async fn store_data(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    upstream.uploads.lock().unwrap().push(RecordedUpload {
        content_type: header_value(&headers, header::CONTENT_TYPE),
        body,
    });
    let status = StatusCode::from_u16(upstream.upload_status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, "").into_response()
}

fn select_response(upstream: &Upstream) -> Response {
    let body = upstream.select_response.lock().unwrap().clone();
    (
        [(header::CONTENT_TYPE, "application/sparql-results+json")],
        body.to_string(),
    )
        .into_response()
}

async fn store_query_post(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    upstream.queries.lock().unwrap().push(RecordedQuery {
        method: "POST",
        content_type: header_value(&headers, header::CONTENT_TYPE),
        accept: header_value(&headers, header::ACCEPT),
        query: body,
    });
    select_response(&upstream)
}

async fn store_query_get(
    State(upstream): State<Arc<Upstream>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.queries.lock().unwrap().push(RecordedQuery {
        method: "GET",
        content_type: None,
        accept: header_value(&headers, header::ACCEPT),
        query: params.get("query").cloned().unwrap_or_default(),
    });
    select_response(&upstream)
}
