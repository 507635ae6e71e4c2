//! Music provider integration: OAuth tokens, catalog API access and the
//! fetch/enrich stages of the import.

pub mod auth;
pub mod client;
pub mod enrichment;
pub mod library;
pub mod models;
pub mod retry_policy;

pub use auth::{AuthError, AuthStatus, OAuthClient, TokenGrant, TokenManager, TokenResponse};
pub use client::{CatalogApi, ProviderClient, ProviderError};
pub use enrichment::{Enrichment, FeatureEnricher};
pub use library::LibraryFetcher;
pub use models::{Artist, AudioFeatures, Track};
pub use retry_policy::RetryPolicy;
