use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use library_graph_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_STORE_DATA_URL, DEFAULT_STORE_QUERY_URL,
};
use library_graph_server::graph_store::GraphStoreClient;
use library_graph_server::import::ImportPipeline;
use library_graph_server::provider::{OAuthClient, ProviderClient, TokenManager};
use library_graph_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use library_graph_server::ServerState;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().context("Error resolving current directory")?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// OAuth client id of the registered provider application.
    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret of the registered provider application.
    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Redirect URI registered with the provider, pointing at /api/spotify/callback.
    #[clap(long, env = "SPOTIFY_REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Triple store endpoint that accepts Turtle uploads.
    #[clap(long, env = "FUSEKI_DATA_URL", default_value = DEFAULT_STORE_DATA_URL)]
    pub store_data_url: String,

    /// Triple store SPARQL query endpoint.
    #[clap(long, env = "FUSEKI_QUERY_URL", default_value = DEFAULT_STORE_QUERY_URL)]
    pub store_query_url: String,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            client_id: args.client_id.clone(),
            client_secret: args.client_secret.clone(),
            redirect_uri: args.redirect_uri.clone(),
            store_data_url: args.store_data_url.clone(),
            store_query_url: args.store_query_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    let oauth = Arc::new(OAuthClient::new(&config.provider)?);
    let tokens = Arc::new(TokenManager::new(
        oauth.clone(),
        config.provider.refresh_margin(),
    ));
    let api = Arc::new(ProviderClient::new(&config.provider, tokens.clone())?);
    info!("Provider API at {}", api.api_url());

    let store = Arc::new(GraphStoreClient::new(&config.store)?);
    info!(
        "Triple store data endpoint {}, query endpoint {}",
        config.store.data_url, config.store.query_url
    );

    let importer = Arc::new(ImportPipeline::new(
        tokens.clone(),
        api,
        store.clone(),
        &config.import,
    ));

    let shutdown_token = CancellationToken::new();
    let state = ServerState {
        config: ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            metrics_port: config.metrics_port,
            frontend_dir_path: config.frontend_dir_path.clone(),
        },
        start_time: Instant::now(),
        hash: env!("GIT_HASH").to_string(),
        oauth,
        tokens,
        importer,
        store,
        shutdown: shutdown_token.clone(),
    };

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);

    let server = run_server(state);
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            shutdown_token.cancel();
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            shutdown_token.cancel();
            server.await
        }
    }
}
