//! # knowledge-search-app
//!
//! Application use cases for multi-collection search.
//! This crate depends on `ports`, `domain`, and `shared`.
//!
//! - [`CollectionLifecycleManager`] creates and inspects collections
//! - [`QueryRouter`] resolves a request to existing collections
//! - [`FanOutExecutor`] searches them concurrently
//! - [`merge_results`] and [`aggregate`] build the final ranking and facets
//! - [`SearchService`] wires the steps together

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod aggregator;
pub mod benchmark;
pub mod fanout;
pub mod health;
pub mod lifecycle;
pub mod merger;
pub mod router;
pub mod search;

#[cfg(test)]
mod testing;

pub use aggregator::aggregate;
pub use benchmark::{SAMPLE_REPEAT, SAMPLE_TEXTS, run_embedding_benchmark};
pub use fanout::{
    CollectionOutcome, CollectionResult, FanOutExecutor, FanOutOptions, FanOutQuery,
};
pub use health::{HealthDeps, collections_overview, health_report};
pub use lifecycle::{CollectionLifecycleManager, CollectionSetupReport, SetupOutcome};
pub use merger::{MergedHits, merge_results};
pub use router::{QueryRouter, RoutePlan, route_candidates};
pub use search::{SearchDeps, SearchService};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
