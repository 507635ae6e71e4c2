//! Library Graph Server
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod error;
pub mod graph;
pub mod graph_store;
pub mod import;
pub mod provider;
pub mod queries;
pub mod server;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use graph_store::{GraphStore, GraphStoreClient};
pub use import::{ImportError, ImportPipeline, ImportSummary};
pub use provider::{CatalogApi, OAuthClient, ProviderClient, TokenManager};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig, ServerState};
