//! Query routing: which collections a search request touches.

use crate::lifecycle::CollectionLifecycleManager;
use knowledge_search_domain::{
    CollectionId, ContentType, PrimitiveError, SearchRequest, SearchScope, TopologyRegistry,
};
use knowledge_search_ports::{LogFields, LoggerPort, error_payload};
use knowledge_search_shared::{ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Collections a request resolved to, split by existence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePlan {
    /// Collections that exist and will be searched.
    pub searchable: Vec<CollectionId>,
    /// Collections the store reported missing.
    pub skipped: Vec<CollectionId>,
    /// Collections whose existence check failed.
    pub unchecked: Vec<(CollectionId, ErrorEnvelope)>,
}

impl RoutePlan {
    /// True when nothing was routed at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.searchable.is_empty() && self.skipped.is_empty() && self.unchecked.is_empty()
    }
}

/// Resolve the candidate collections of `request` without touching the store.
///
/// Globals come first, then each project's collections in request order.
/// The list is deduplicated.
pub fn route_candidates(
    topology: &TopologyRegistry,
    request: &SearchRequest,
) -> std::result::Result<Vec<CollectionId>, PrimitiveError> {
    let mut raw = Vec::new();
    if matches!(request.scope(), SearchScope::Global | SearchScope::All) {
        raw.extend(topology.global_collections().iter().cloned());
    }
    if matches!(request.scope(), SearchScope::Project | SearchScope::All) {
        let content_types = request.content_types().unwrap_or(&ContentType::ALL);
        for project in request.projects() {
            let collections = topology.project_collections(project)?;
            raw.extend(
                content_types
                    .iter()
                    .map(|content_type| collections.get(*content_type).clone()),
            );
        }
    }

    let mut seen = BTreeSet::new();
    raw.retain(|collection| seen.insert(collection.clone()));
    Ok(raw)
}

/// Turns requests into existing collection lists.
#[derive(Clone)]
pub struct QueryRouter {
    lifecycle: CollectionLifecycleManager,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl QueryRouter {
    /// Route through `lifecycle` and its topology.
    #[must_use]
    pub const fn new(lifecycle: CollectionLifecycleManager) -> Self {
        Self {
            lifecycle,
            logger: None,
        }
    }

    /// Attach a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Candidate collections before the existence check.
    pub fn candidates(&self, request: &SearchRequest) -> Result<Vec<CollectionId>> {
        route_candidates(self.lifecycle.topology(), request).map_err(ErrorEnvelope::from)
    }

    /// Candidate collections split by whether they exist.
    ///
    /// Missing collections are logged and skipped. A failed existence check
    /// does not fail the request; the collection is reported as unchecked.
    pub async fn route(&self, ctx: &RequestContext, request: &SearchRequest) -> Result<RoutePlan> {
        let candidates = self.candidates(request)?;
        let checked = self.lifecycle.exists_many(ctx, candidates).await?;

        let mut plan = RoutePlan::default();
        for (collection, exists) in checked {
            match exists {
                Ok(true) => plan.searchable.push(collection),
                Ok(false) => {
                    if let Some(logger) = self.logger.as_ref() {
                        let mut fields = LogFields::new();
                        fields.insert("collection".into(), Value::from(collection.as_str()));
                        logger.warn(
                            "search.route.skipped_missing",
                            "Collection does not exist; skipping",
                            Some(fields),
                        );
                    }
                    plan.skipped.push(collection);
                },
                Err(error) => {
                    if let Some(logger) = self.logger.as_ref() {
                        let mut fields = LogFields::new();
                        fields.insert("collection".into(), Value::from(collection.as_str()));
                        fields.insert("error".into(), error_payload(&error));
                        logger.warn(
                            "search.route.check_failed",
                            "Collection existence check failed",
                            Some(fields),
                        );
                    }
                    plan.unchecked.push((collection, error));
                },
            }
        }
        Ok(plan)
    }
}
