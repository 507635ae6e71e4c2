use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::graph_store::GraphStore;
use crate::import::ImportPipeline;
use crate::provider::{OAuthClient, TokenManager};

use super::ServerConfig;

pub type GuardedOAuthClient = Arc<OAuthClient>;
pub type GuardedTokenManager = Arc<TokenManager>;
pub type GuardedImportPipeline = Arc<ImportPipeline>;
pub type GuardedGraphStore = Arc<dyn GraphStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub oauth: GuardedOAuthClient,
    pub tokens: GuardedTokenManager,
    pub importer: GuardedImportPipeline,
    pub store: GuardedGraphStore,
    /// Cancelled on shutdown. Import runs use child tokens of it.
    pub shutdown: CancellationToken,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedOAuthClient {
    fn from_ref(input: &ServerState) -> Self {
        input.oauth.clone()
    }
}

impl FromRef<ServerState> for GuardedTokenManager {
    fn from_ref(input: &ServerState) -> Self {
        input.tokens.clone()
    }
}

impl FromRef<ServerState> for GuardedGraphStore {
    fn from_ref(input: &ServerState) -> Self {
        input.store.clone()
    }
}
