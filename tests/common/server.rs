//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server wired to its own fake upstream.

use super::constants::*;
use super::upstream::Upstream;
use library_graph_server::config::{ImportSettings, ProviderSettings, StoreSettings};
use library_graph_server::graph_store::{GraphStoreClient, QueryMethod};
use library_graph_server::import::ImportPipeline;
use library_graph_server::provider::{OAuthClient, ProviderClient, TokenManager};
use library_graph_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Knobs for the server under test
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub query_method: QueryMethod,
    pub max_tracks: usize,
    pub import_timeout: Duration,
    pub max_retries: u32,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            query_method: QueryMethod::Post,
            max_tracks: 200,
            import_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// Test server instance with its fake upstream
///
/// When dropped, both the server and the upstream shut down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Fake provider and triple store, for configuring responses and
    /// inspecting what the server sent
    pub upstream: Arc<Upstream>,

    shutdown: CancellationToken,
}

impl TestServer {
    /// Spawns a new test server on a random port with default options
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the upstream or the server fail to start, or if the
    /// server doesn't become ready within timeout.
    pub async fn spawn_with(options: TestOptions) -> Self {
        let upstream = Upstream::spawn().await;

        let provider = ProviderSettings {
            client_id: CLIENT_ID.to_string(),
            client_secret: CLIENT_SECRET.to_string(),
            redirect_uri: REDIRECT_URI.to_string(),
            accounts_url: format!("{}/accounts", upstream.base_url),
            api_url: format!("{}/v1", upstream.base_url),
            request_timeout_sec: 5,
            max_retries: options.max_retries,
            initial_backoff_ms: 5,
            max_backoff_ms: 50,
            ..Default::default()
        };
        let store_settings = StoreSettings {
            data_url: format!("{}/store/data", upstream.base_url),
            query_url: format!("{}/store/query", upstream.base_url),
            query_method: options.query_method,
            request_timeout_sec: 5,
        };
        let import_settings = ImportSettings {
            max_tracks: options.max_tracks,
            ..Default::default()
        };

        let oauth = Arc::new(OAuthClient::new(&provider).expect("Failed to build OAuth client"));
        let tokens = Arc::new(TokenManager::new(oauth.clone(), provider.refresh_margin()));
        let api = Arc::new(
            ProviderClient::new(&provider, tokens.clone()).expect("Failed to build provider client"),
        );
        let store = Arc::new(
            GraphStoreClient::new(&store_settings).expect("Failed to build store client"),
        );
        let importer = Arc::new(
            ImportPipeline::new(tokens.clone(), api, store.clone(), &import_settings)
                .with_timeout(options.import_timeout),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let shutdown = CancellationToken::new();
        let state = ServerState {
            config: ServerConfig {
                requests_logging_level: RequestsLoggingLevel::None,
                port,
                metrics_port: 0,
                frontend_dir_path: None,
            },
            start_time: Instant::now(),
            hash: "test".to_string(),
            oauth,
            tokens,
            importer,
            store,
            shutdown: shutdown.clone(),
        };
        let app = make_app(state);

        let server_shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            upstream,
            shutdown,
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }

    /// Cancels the server's shutdown token, which also cancels running imports
    pub fn begin_shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.upstream.shutdown();
    }
}
