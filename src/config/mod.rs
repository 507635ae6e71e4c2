mod file_config;

pub use file_config::{FileConfig, ImportFileConfig, ProviderFileConfig, StoreFileConfig};

use crate::graph_store::QueryMethod;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::time::Duration;

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_STORE_DATA_URL: &str = "http://localhost:3030/spotify/data";
pub const DEFAULT_STORE_QUERY_URL: &str = "http://localhost:3030/spotify/query";
pub const DEFAULT_SCOPES: [&str; 3] = [
    "user-library-read",
    "user-read-recently-played",
    "playlist-read-private",
];

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub store_data_url: String,
    pub store_query_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,

    // Feature configs (with defaults)
    pub provider: ProviderSettings,
    pub store: StoreSettings,
    pub import: ImportSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        // Provider settings - credentials are mandatory, the rest has defaults
        let p_file = file.provider.unwrap_or_default();
        let client_id = p_file
            .client_id
            .or_else(|| cli.client_id.clone())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!("client_id must be specified via --client-id or in config file")
            })?;
        let client_secret = p_file
            .client_secret
            .or_else(|| cli.client_secret.clone())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "client_secret must be specified via --client-secret or in config file"
                )
            })?;
        let redirect_uri = p_file
            .redirect_uri
            .or_else(|| cli.redirect_uri.clone())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "redirect_uri must be specified via --redirect-uri or in config file"
                )
            })?;

        let defaults = ProviderSettings::default();
        let provider = ProviderSettings {
            client_id,
            client_secret,
            redirect_uri,
            scopes: p_file.scopes.unwrap_or(defaults.scopes),
            accounts_url: p_file.accounts_url.unwrap_or(defaults.accounts_url),
            api_url: p_file.api_url.unwrap_or(defaults.api_url),
            request_timeout_sec: p_file
                .request_timeout_sec
                .unwrap_or(defaults.request_timeout_sec),
            refresh_margin_sec: p_file
                .refresh_margin_sec
                .unwrap_or(defaults.refresh_margin_sec),
            max_retries: p_file.max_retries.unwrap_or(defaults.max_retries),
            initial_backoff_ms: p_file
                .initial_backoff_ms
                .unwrap_or(defaults.initial_backoff_ms),
            max_backoff_ms: p_file.max_backoff_ms.unwrap_or(defaults.max_backoff_ms),
            backoff_multiplier: p_file
                .backoff_multiplier
                .unwrap_or(defaults.backoff_multiplier),
        };
        if provider.backoff_multiplier < 1.0 {
            bail!("provider.backoff_multiplier must be >= 1.0");
        }

        let s_file = file.store.unwrap_or_default();
        let query_method = match s_file.query_method {
            Some(s) => match parse_query_method(&s) {
                Some(m) => m,
                None => bail!("Invalid store.query_method: {} (expected post or get)", s),
            },
            None => QueryMethod::Post,
        };
        let store = StoreSettings {
            data_url: s_file
                .data_url
                .unwrap_or_else(|| cli.store_data_url.clone()),
            query_url: s_file
                .query_url
                .unwrap_or_else(|| cli.store_query_url.clone()),
            query_method,
            request_timeout_sec: s_file
                .request_timeout_sec
                .unwrap_or(StoreSettings::default().request_timeout_sec),
        };

        let i_file = file.import.unwrap_or_default();
        let import_defaults = ImportSettings::default();
        let import = ImportSettings {
            max_tracks: i_file.max_tracks.unwrap_or(import_defaults.max_tracks),
            enrichment_concurrency: i_file
                .enrichment_concurrency
                .unwrap_or(import_defaults.enrichment_concurrency),
            timeout_sec: i_file.timeout_sec.unwrap_or(import_defaults.timeout_sec),
        };
        if import.max_tracks == 0 {
            bail!("import.max_tracks must be greater than 0");
        }
        if import.enrichment_concurrency == 0 {
            bail!("import.enrichment_concurrency must be at least 1");
        }

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            provider,
            store,
            import,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub accounts_url: String,
    pub api_url: String,
    pub request_timeout_sec: u64,
    /// Access tokens with less remaining life than this are refreshed.
    pub refresh_margin_sec: u64,
    // Retry settings
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl ProviderSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_sec)
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_sec: 30,
            refresh_margin_sec: 60,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub data_url: String,
    pub query_url: String,
    pub query_method: QueryMethod,
    pub request_timeout_sec: u64,
}

impl StoreSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_STORE_DATA_URL.to_string(),
            query_url: DEFAULT_STORE_QUERY_URL.to_string(),
            query_method: QueryMethod::Post,
            request_timeout_sec: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportSettings {
    pub max_tracks: usize,
    /// Maximum number of enrichment chunk requests in flight at once.
    pub enrichment_concurrency: usize,
    pub timeout_sec: u64,
}

impl ImportSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_sec)
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_tracks: 200,
            enrichment_concurrency: 4,
            timeout_sec: 300,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

fn parse_query_method(s: &str) -> Option<QueryMethod> {
    QueryMethod::from_str(s, true).ok()
}
