//! # knowledge-search-ports
//!
//! Port traits for the knowledge-search hexagonal architecture.
//!
//! This crate defines the interfaces between the search orchestration and
//! the external collaborators it needs (embedding provider, vector store,
//! logging, telemetry). It depends only on `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod embedding;
pub mod logger;
pub mod telemetry;
pub mod vector_store;

pub use embedding::*;
pub use logger::*;
pub use telemetry::*;
pub use vector_store::*;

// Re-export the domain types used in port signatures, so adapter crates
// can implement ports without directly depending on `knowledge-search-domain`.
pub use knowledge_search_domain::{
    CollectionId, CollectionInfo, CollectionSpec, DistanceMetric, FieldCondition, FieldMatch,
    HitMetadata, IndexParams, MetadataFilter, MetricsSnapshot, ScoredHit, TimerSummary,
};
