//! The import job: fetch → enrich → build → serialize → upload.
//!
//! One run is one unit of work. It is raced against its cancellation token
//! at every network await and bounded by an overall timeout; each run owns
//! its fact set, so nothing here is shared between runs.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ImportSettings;
use crate::graph::{GraphBuilder, GraphSerializer, GraphStats};
use crate::graph_store::{GraphStore, StoreError};
use crate::provider::{AuthError, CatalogApi, FeatureEnricher, LibraryFetcher, ProviderError, TokenManager};
use crate::server::metrics;

#[derive(Debug, Clone, Error)]
pub enum ImportError {
    #[error(transparent)]
    Auth(AuthError),

    #[error(transparent)]
    Provider(ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Import cancelled")]
    Cancelled,

    #[error("Import did not finish within {0:?}")]
    TimedOut(Duration),
}

impl From<AuthError> for ImportError {
    fn from(e: AuthError) -> Self {
        ImportError::Auth(e)
    }
}

impl From<ProviderError> for ImportError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Auth(e) => ImportError::Auth(e),
            other => ImportError::Provider(other),
        }
    }
}

impl ImportError {
    fn metric_label(&self) -> &'static str {
        match self {
            ImportError::Auth(_) => "auth_error",
            ImportError::Provider(_) => "provider_error",
            ImportError::Store(_) => "store_error",
            ImportError::Cancelled => "cancelled",
            ImportError::TimedOut(_) => "timeout",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub run_id: String,
    /// Saved tracks fetched and written to the store.
    pub tracks: usize,
    pub stats: GraphStats,
    pub document_bytes: usize,
    pub duration_ms: u64,
}

pub struct ImportPipeline {
    tokens: Arc<TokenManager>,
    fetcher: LibraryFetcher,
    enricher: FeatureEnricher,
    store: Arc<dyn GraphStore>,
    max_tracks: usize,
    timeout: Duration,
}

impl ImportPipeline {
    pub fn new(
        tokens: Arc<TokenManager>,
        api: Arc<dyn CatalogApi>,
        store: Arc<dyn GraphStore>,
        settings: &ImportSettings,
    ) -> Self {
        Self {
            tokens,
            fetcher: LibraryFetcher::new(api.clone()),
            enricher: FeatureEnricher::new(api, settings.enrichment_concurrency),
            store,
            max_tracks: settings.max_tracks,
            timeout: settings.timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs one import. Data already in the store is never removed.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<ImportSummary, ImportError> {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        info!("[import {}] Starting, up to {} tracks", run_id, self.max_tracks);

        let result = match tokio::time::timeout(self.timeout, self.run_stages(&run_id, cancel)).await
        {
            Ok(result) => result,
            Err(_) => Err(ImportError::TimedOut(self.timeout)),
        };

        match result {
            Ok((tracks, stats, document_bytes)) => {
                let summary = ImportSummary {
                    run_id,
                    tracks,
                    stats,
                    document_bytes,
                    duration_ms: started.elapsed().as_millis() as u64,
                };
                metrics::record_import_run("success");
                metrics::set_imported_tracks(tracks);
                info!(
                    "[import {}] Imported {} tracks ({} artists, {} genres, {} with features) in {}ms",
                    summary.run_id,
                    summary.tracks,
                    summary.stats.artists,
                    summary.stats.genres,
                    summary.stats.audio_features,
                    summary.duration_ms
                );
                Ok(summary)
            }
            Err(e) => {
                metrics::record_import_run(e.metric_label());
                match &e {
                    ImportError::Cancelled => warn!("[import {}] Cancelled", run_id),
                    _ => error!("[import {}] Failed: {}", run_id, e),
                }
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        run_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(usize, GraphStats, usize), ImportError> {
        until_cancelled(cancel, self.tokens.ensure_valid_token()).await?;

        let tracks = until_cancelled(cancel, self.fetcher.fetch_saved_tracks(self.max_tracks)).await?;

        let enrichment = until_cancelled(cancel, self.enricher.enrich(&tracks)).await?;

        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }
        let graph = GraphBuilder::new().build(
            &tracks,
            &enrichment.features_by_id,
            &enrichment.genres_by_artist,
        );
        let document = GraphSerializer::serialize(&graph);
        info!(
            "[import {}] Built {} facts ({} bytes)",
            run_id,
            graph.facts.len(),
            document.len()
        );

        let document_bytes = document.len();
        until_cancelled(cancel, self.store.import(document)).await?;

        Ok((tracks.len(), graph.stats, document_bytes))
    }
}

async fn until_cancelled<T, E, F>(cancel: &CancellationToken, fut: F) -> Result<T, ImportError>
where
    F: Future<Output = Result<T, E>>,
    ImportError: From<E>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ImportError::Cancelled),
        result = fut => result.map_err(ImportError::from),
    }
}
