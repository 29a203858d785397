//! # knowledge-search-domain
//!
//! Domain model for routing searches across per-project vector collections.
//!
//! - **Primitives** - `ProjectName`, `CollectionId`, `PrimitiveError`
//! - **Catalog** - `ContentType`, `SearchScope`, `SearchMode`, `HierarchyLevel`
//! - **Topology** - `TopologyRegistry`, the only producer of collection ids
//! - **Requests** - `SearchRequest` (validated) and `MetadataFilter`
//! - **Results** - `ScoredHit`, `Aggregations`, `SearchResponse`
//! - **Collections** - creation specs and store statistics
//! - **Diagnostics** - health, metrics, and benchmark reports
//!
//! ## Dependency Rules
//!
//! - Depends only on `shared` crate
//! - No infrastructure or adapter dependencies
//! - Pure domain logic with no I/O

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use knowledge_search_shared::shared_crate_version;

pub mod catalog;
pub mod collections;
pub mod diagnostics;
pub mod filter;
pub mod primitives;
pub mod request;
pub mod search;
pub mod topology;

pub use catalog::{ContentType, HierarchyLevel, SearchMode, SearchScope};
pub use collections::{
    CollectionInfo, CollectionSpec, CollectionStatsSummary, DistanceMetric, IndexParams,
};
pub use diagnostics::{
    BatchEncoding, BenchmarkReport, EmbeddingStatus, HealthReport, MetricsSnapshot, ModelSummary,
    ServiceSummary, SingleEncoding, TimerSummary,
};
pub use filter::{FRAMEWORK_KEY, FieldCondition, FieldMatch, HIERARCHY_LEVEL_KEY, MetadataFilter};
pub use primitives::{
    CollectionId, MAX_COLLECTION_NAME_LEN, MAX_PROJECT_NAME_LEN, PrimitiveError, ProjectName,
};
pub use request::{
    DEFAULT_LIMIT, DEFAULT_SCORE_THRESHOLD, MAX_LIMIT, MIN_LIMIT, SearchRequest,
    SearchRequestInput,
};
pub use search::{
    Aggregations, CONTENT_TYPE_KEY, FacetCounts, HitMetadata, NO_COLLECTIONS_STRATEGY, PROJECT_KEY,
    ScoredHit, SearchResponse, UNKNOWN_FACET,
};
pub use topology::{
    DEFAULT_GLOBAL_PRINCIPLES, DEFAULT_UNIFIED_INDEX, ProjectCollections, TopologyRegistry,
};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_depends_only_on_shared() {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let workspace_deps: Vec<&str> = cargo_toml
            .lines()
            .filter(|line| line.starts_with("knowledge-search-"))
            .collect();
        assert_eq!(workspace_deps, vec!["knowledge-search-shared.workspace = true"]);
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
