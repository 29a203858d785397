//! Vector store boundary contract.
//!
//! Only the per-collection operations the search layer needs: existence,
//! creation, deletion, nearest-neighbor search, statistics, and a
//! store-wide reachability probe. Ingestion is out of scope.

use crate::BoxFuture;
use knowledge_search_domain::{
    CollectionId, CollectionInfo, CollectionSpec, MetadataFilter, ScoredHit,
};
use knowledge_search_shared::{RequestContext, Result};
use std::sync::Arc;

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorStoreInfo {
    /// Stable provider label (e.g. `qdrant`).
    pub provider: Box<str>,
    /// Base URL of the store, without credentials.
    pub endpoint: Box<str>,
}

/// Nearest-neighbor search against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchQuery {
    /// Target collection.
    pub collection: CollectionId,
    /// Dense query vector.
    pub vector: Arc<[f32]>,
    /// Maximum hits to return.
    pub limit: u32,
    /// Minimum score a hit must reach.
    pub score_threshold: Option<f32>,
    /// Payload filter applied inside the store.
    pub filter: Option<MetadataFilter>,
    /// Whether hit content is returned alongside metadata.
    pub with_content: bool,
}

/// Boundary contract for the backing vector store.
pub trait VectorStorePort: Send + Sync {
    /// Provider info for this implementation.
    fn info(&self) -> &VectorStoreInfo;

    /// Return true when the collection exists.
    fn collection_exists(
        &self,
        ctx: &RequestContext,
        collection: CollectionId,
    ) -> BoxFuture<'_, Result<bool>>;

    /// Create a collection. Fails if it already exists.
    fn create_collection(
        &self,
        ctx: &RequestContext,
        collection: CollectionId,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<()>>;

    /// Delete a collection.
    fn delete_collection(
        &self,
        ctx: &RequestContext,
        collection: CollectionId,
    ) -> BoxFuture<'_, Result<()>>;

    /// Search one collection; hits come back score descending.
    fn search(
        &self,
        ctx: &RequestContext,
        query: VectorSearchQuery,
    ) -> BoxFuture<'_, Result<Vec<ScoredHit>>>;

    /// Statistics for one collection, by store name.
    fn collection_info(
        &self,
        ctx: &RequestContext,
        name: Box<str>,
    ) -> BoxFuture<'_, Result<CollectionInfo>>;

    /// Names of every collection in the store.
    fn list_collections(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<Box<str>>>>;

    /// Succeeds when the store can be reached.
    fn health_check(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<()>>;
}
