//! HTTP client for the triple store's graph store and query endpoints.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use thiserror::Error;
use tracing::{debug, error};

use super::results::SelectResults;
use crate::config::StoreSettings;
use crate::graph::TURTLE_CONTENT_TYPE;
use crate::server::metrics;

const SPARQL_QUERY_CONTENT_TYPE: &str = "application/sparql-query";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Triple store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Triple store request failed: {0}")]
    Transport(String),

    #[error("Invalid triple store response: {0}")]
    Decode(String),
}

/// How SELECT queries are sent to the query endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryMethod {
    /// Query text as an `application/sparql-query` body.
    Post,
    /// Query text in the `query` URL parameter.
    Get,
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Adds a Turtle document to the store. Existing data is kept.
    async fn import(&self, document: String) -> Result<(), StoreError>;

    /// Runs a SELECT query.
    async fn select(&self, query: &str) -> Result<SelectResults, StoreError>;
}

pub struct GraphStoreClient {
    http: reqwest::Client,
    data_url: String,
    query_url: String,
    query_method: QueryMethod,
}

impl GraphStoreClient {
    pub fn new(settings: &StoreSettings) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            data_url: settings.data_url.clone(),
            query_url: settings.query_url.clone(),
            query_method: settings.query_method,
        })
    }

    fn get_query_url(&self, query: &str) -> String {
        let separator = if self.query_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}query={}",
            self.query_url,
            separator,
            urlencoding::encode(query)
        )
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StoreError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_store_request(operation, "error");
                error!("Triple store {} failed: {}", operation, e);
                return Err(StoreError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        metrics::record_store_request(operation, status.as_str());
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Triple store {} returned {}: {}", operation, status, body);
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GraphStore for GraphStoreClient {
    async fn import(&self, document: String) -> Result<(), StoreError> {
        debug!("Uploading {} bytes to {}", document.len(), self.data_url);
        let request = self
            .http
            .post(&self.data_url)
            .header(CONTENT_TYPE, TURTLE_CONTENT_TYPE)
            .body(document);
        self.send("import", request).await?;
        Ok(())
    }

    async fn select(&self, query: &str) -> Result<SelectResults, StoreError> {
        let request = match self.query_method {
            QueryMethod::Post => self
                .http
                .post(&self.query_url)
                .header(CONTENT_TYPE, SPARQL_QUERY_CONTENT_TYPE)
                .body(query.to_string()),
            QueryMethod::Get => self.http.get(self.get_query_url(query)),
        }
        .header(ACCEPT, SPARQL_RESULTS_JSON);

        let response = self.send("select", request).await?;
        response
            .json::<SelectResults>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}
