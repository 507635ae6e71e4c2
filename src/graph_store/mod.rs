//! Access to the external triple store.

mod client;
mod results;

pub use client::{GraphStore, GraphStoreClient, QueryMethod, StoreError};
pub use results::{Binding, BoundValue, ResultBindings, ResultsHead, SelectResults};
