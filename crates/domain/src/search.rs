//! Search hits, facet aggregations, and responses.

use crate::{CollectionId, SearchMode};
use serde_json::Value;
use std::collections::BTreeMap;

/// Payload metadata of a stored document, minus its content.
pub type HitMetadata = BTreeMap<String, Value>;

/// Facet value used when a document lacks the field.
pub const UNKNOWN_FACET: &str = "unknown";

/// Payload key holding the content type label.
pub const CONTENT_TYPE_KEY: &str = "content_type";

/// Payload key holding the owning project.
pub const PROJECT_KEY: &str = "project";

/// Strategy label for requests that routed to no collection.
pub const NO_COLLECTIONS_STRATEGY: &str = "no_collections";

/// One document matched in one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHit {
    /// Document identifier as stored.
    pub id: Box<str>,
    /// Similarity score (cosine: `[0, 1]`).
    pub score: f32,
    /// Collection the hit came from.
    pub collection: CollectionId,
    /// Payload metadata.
    pub metadata: HitMetadata,
    /// Document content, when requested.
    pub content: Option<Box<str>>,
}

impl ScoredHit {
    /// Facet value of a metadata field.
    ///
    /// Missing, null, and blank values read as [`UNKNOWN_FACET`]; non-string
    /// scalars use their JSON rendering.
    #[must_use]
    pub fn facet(&self, key: &str) -> Box<str> {
        match self.metadata.get(key) {
            None | Some(Value::Null) => UNKNOWN_FACET.into(),
            Some(Value::String(value)) if value.trim().is_empty() => UNKNOWN_FACET.into(),
            Some(Value::String(value)) => value.as_str().into(),
            Some(other) => other.to_string().into_boxed_str(),
        }
    }
}

/// Count of hits per facet value.
pub type FacetCounts = BTreeMap<Box<str>, u64>;

/// Facet counts over the returned hits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregations {
    /// Counts by `content_type`.
    pub content_types: FacetCounts,
    /// Counts by `framework` (unknown frameworks are not counted).
    pub frameworks: FacetCounts,
    /// Counts by `project`.
    pub projects: FacetCounts,
    /// Counts by `hierarchy_level`.
    pub hierarchy_levels: FacetCounts,
}

/// Merged, limited answer to a search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    /// Query text as searched.
    pub query: Box<str>,
    /// Hits, score descending, at most `limit`.
    pub hits: Vec<ScoredHit>,
    /// Hits found across all searched collections before truncation.
    pub total_found: u64,
    /// Wall time spent serving the request.
    pub processing_time_ms: f64,
    /// `"{mode}_multi_collection"` or `"no_collections"`.
    pub search_strategy: Box<str>,
    /// Collections that existed and answered successfully.
    pub collections_searched: Vec<CollectionId>,
    /// Facet counts over `hits`.
    pub aggregations: Aggregations,
}

impl SearchResponse {
    /// Response for a request that routed to no collection.
    #[must_use]
    pub fn no_collections(query: impl Into<Box<str>>, processing_time_ms: f64) -> Self {
        Self {
            query: query.into(),
            hits: Vec::new(),
            total_found: 0,
            processing_time_ms,
            search_strategy: NO_COLLECTIONS_STRATEGY.into(),
            collections_searched: Vec::new(),
            aggregations: Aggregations::default(),
        }
    }

    /// Strategy label for a request that reached at least one collection.
    #[must_use]
    pub fn multi_collection_strategy(mode: SearchMode) -> Box<str> {
        format!("{}_multi_collection", mode.as_str()).into_boxed_str()
    }
}
