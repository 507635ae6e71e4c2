//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

/// HTTP test client. Redirects are not followed so `/login` can be inspected.
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client whose server has completed the OAuth callback
    ///
    /// # Panics
    ///
    /// Panics if the code exchange fails (indicates test infrastructure problem).
    pub async fn authorized(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.callback(AUTH_CODE).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Code exchange failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(self.url("/"))
            .send()
            .await
            .expect("Home request failed")
    }

    // ========================================================================
    // Provider Account Endpoints
    // ========================================================================

    /// GET /api/spotify/login
    pub async fn login(&self) -> Response {
        self.client
            .get(self.url("/api/spotify/login"))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /api/spotify/callback?code=
    pub async fn callback(&self, code: &str) -> Response {
        self.client
            .get(self.url("/api/spotify/callback"))
            .query(&[("code", code)])
            .send()
            .await
            .expect("Callback request failed")
    }

    /// GET /api/spotify/callback with raw query parameters
    pub async fn callback_with(&self, params: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/api/spotify/callback"))
            .query(params)
            .send()
            .await
            .expect("Callback request failed")
    }

    /// GET /api/spotify/status
    pub async fn status(&self) -> Response {
        self.client
            .get(self.url("/api/spotify/status"))
            .send()
            .await
            .expect("Status request failed")
    }

    /// POST /api/spotify/import
    pub async fn import(&self) -> Response {
        self.client
            .post(self.url("/api/spotify/import"))
            .send()
            .await
            .expect("Import request failed")
    }

    // ========================================================================
    // Semantic Query Endpoints
    // ========================================================================

    /// GET /api/semantic/party-tracks
    pub async fn party_tracks(&self, params: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/api/semantic/party-tracks"))
            .query(params)
            .send()
            .await
            .expect("Party tracks request failed")
    }

    /// GET /api/semantic/similar
    pub async fn similar(&self, params: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/api/semantic/similar"))
            .query(params)
            .send()
            .await
            .expect("Similar request failed")
    }

    /// POST /api/semantic/genre-recs with a JSON body
    pub async fn genre_recs(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/api/semantic/genre-recs"))
            .json(body)
            .send()
            .await
            .expect("Genre recs request failed")
    }

    /// POST /api/semantic/genre-recs without a body
    pub async fn genre_recs_empty(&self) -> Response {
        self.client
            .post(self.url("/api/semantic/genre-recs"))
            .send()
            .await
            .expect("Genre recs request failed")
    }

    // ========================================================================
    // Graph View Endpoints
    // ========================================================================

    /// GET /api/genre/graph
    pub async fn genre_graph(&self) -> Response {
        self.client
            .get(self.url("/api/genre/graph"))
            .send()
            .await
            .expect("Genre graph request failed")
    }

    /// GET /api/artist/graph
    pub async fn artist_graph(&self) -> Response {
        self.client
            .get(self.url("/api/artist/graph"))
            .send()
            .await
            .expect("Artist graph request failed")
    }
}
