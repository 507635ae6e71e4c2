//! Error taxonomy shared across the service.
//!
//! Each layer owns its error type; this module gathers them in one place
//! and adds `ValidationError` for bad input at the HTTP boundary.

use thiserror::Error;

pub use crate::graph_store::StoreError;
pub use crate::import::ImportError;
pub use crate::provider::{AuthError, ProviderError};

/// A request parameter is missing or unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
