//! Concurrent per-collection search with independent failure handling.

use knowledge_search_domain::{CollectionId, MetadataFilter, ScoredHit};
use knowledge_search_ports::{VectorSearchQuery, VectorStorePort};
use knowledge_search_shared::{
    ErrorEnvelope, RequestContext, Result, WorkerPool, WorkerPoolOptions, timeout_with_context,
};
use std::sync::Arc;
use std::time::Duration;

/// Terminal state of one collection's search.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOutcome {
    /// The collection answered.
    Succeeded(Vec<ScoredHit>),
    /// The call errored or timed out.
    Failed(ErrorEnvelope),
    /// The collection does not exist.
    Skipped,
}

/// Outcome for one routed collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResult {
    /// Searched collection.
    pub collection: CollectionId,
    /// What happened.
    pub outcome: CollectionOutcome,
}

impl CollectionResult {
    /// Whether the collection returned hits (possibly none).
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.outcome, CollectionOutcome::Succeeded(_))
    }

    /// Whether the collection call failed.
    #[must_use]
    pub const fn failed(&self) -> bool {
        matches!(self.outcome, CollectionOutcome::Failed(_))
    }
}

/// Options for [`FanOutExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutOptions {
    /// Multiplier applied to the request limit for each collection.
    pub over_fetch_factor: u32,
    /// Deadline for each collection call.
    pub per_collection_timeout: Duration,
    /// Maximum collection calls in flight.
    pub max_concurrency: usize,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        Self {
            over_fetch_factor: 2,
            per_collection_timeout: Duration::from_secs(10),
            max_concurrency: 16,
        }
    }
}

/// Parameters shared by every collection call of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutQuery {
    /// Query embedding.
    pub vector: Arc<[f32]>,
    /// Requested result limit, before over-fetching.
    pub limit: u32,
    /// Minimum score pushed down to the store.
    pub score_threshold: f32,
    /// Optional metadata filter.
    pub filter: Option<MetadataFilter>,
    /// Whether hits should carry content.
    pub with_content: bool,
}

/// Runs one query against many collections at once.
#[derive(Clone)]
pub struct FanOutExecutor {
    store: Arc<dyn VectorStorePort>,
    options: FanOutOptions,
}

impl FanOutExecutor {
    /// Build an executor over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn VectorStorePort>, options: FanOutOptions) -> Self {
        Self { store, options }
    }

    /// Executor options.
    #[must_use]
    pub const fn options(&self) -> FanOutOptions {
        self.options
    }

    /// Per-collection limit for a request limit.
    #[must_use]
    pub const fn per_collection_limit(&self, limit: u32) -> u32 {
        limit.saturating_mul(self.options.over_fetch_factor)
    }

    /// Search every collection and wait for all of them.
    ///
    /// Results keep the order of `collections`. A failed search, including
    /// a timeout or a panicked task, is reported as
    /// [`CollectionOutcome::Failed`]; only cancellation fails the call.
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        collections: Vec<CollectionId>,
        query: FanOutQuery,
    ) -> Result<Vec<CollectionResult>> {
        if collections.is_empty() {
            return Ok(Vec::new());
        }

        let pool = WorkerPool::new(
            ctx.clone(),
            WorkerPoolOptions {
                concurrency: self.options.max_concurrency.max(1),
            },
        )?;
        let store = Arc::clone(&self.store);
        let task_ctx = ctx.clone();
        let timeout = self.options.per_collection_timeout;
        let limit = self.per_collection_limit(query.limit);
        let query = Arc::new(query);

        let settled = pool
            .map_settled(collections.clone(), move |collection: CollectionId, _index| {
                let store = Arc::clone(&store);
                let ctx = task_ctx.clone();
                let query = Arc::clone(&query);
                async move {
                    let request = VectorSearchQuery {
                        collection,
                        vector: Arc::clone(&query.vector),
                        limit,
                        score_threshold: Some(query.score_threshold),
                        filter: query.filter.clone(),
                        with_content: query.with_content,
                    };
                    timeout_with_context(
                        &ctx,
                        timeout,
                        "fanout.collection_search",
                        store.search(&ctx, request),
                    )
                    .await
                }
            })
            .await?;
        ctx.ensure_not_cancelled("fanout.execute")?;

        collections
            .into_iter()
            .zip(settled)
            .map(|(collection, searched)| {
                let outcome = match searched {
                    Ok(hits) => CollectionOutcome::Succeeded(hits),
                    Err(error) if error.is_cancelled() => return Err(error),
                    Err(error) => CollectionOutcome::Failed(
                        error.with_metadata("collection", collection.as_str()),
                    ),
                };
                Ok(CollectionResult {
                    collection,
                    outcome,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, hit};
    use knowledge_search_domain::{HierarchyLevel, ProjectName, TopologyRegistry};
    use knowledge_search_shared::ErrorCode;

    fn query(limit: u32) -> FanOutQuery {
        FanOutQuery {
            vector: Arc::from(vec![0.5_f32; 4]),
            limit,
            score_threshold: 0.2,
            filter: MetadataFilter::from_constraints(Some("go"), &[HierarchyLevel::Function]),
            with_content: true,
        }
    }

    #[tokio::test]
    async fn failing_collection_does_not_fail_the_fanout() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let topology = TopologyRegistry::default();
        let [a, b] = [
            topology.global_principles().clone(),
            topology.unified_index().clone(),
        ];
        store.insert_hits(&a, vec![hit(&a, "a1", 0.9, &[])]);
        store.insert_collection(b.clone());
        store.fail_search_for(b.clone());

        let executor = FanOutExecutor::new(Arc::new(store), FanOutOptions::default());
        let results = executor.execute(&ctx, vec![a.clone(), b.clone()], query(5)).await?;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].collection, a);
        assert!(results[0].succeeded());
        assert!(results[1].failed());
        if let CollectionOutcome::Failed(error) = &results[1].outcome {
            assert_eq!(
                error.metadata.get("collection").map(String::as_str),
                Some(b.as_str())
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn requests_over_fetched_limit_with_threshold_and_filter() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let collection = TopologyRegistry::default().global_principles().clone();
        store.insert_collection(collection.clone());
        let options = FanOutOptions {
            over_fetch_factor: 3,
            ..FanOutOptions::default()
        };

        let executor = FanOutExecutor::new(Arc::new(store.clone()), options);
        executor.execute(&ctx, vec![collection], query(4)).await?;

        let queries = store.queries()?;
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].limit, 12);
        assert_eq!(queries[0].score_threshold, Some(0.2));
        assert_eq!(queries[0].filter, query(4).filter);
        Ok(())
    }

    #[tokio::test]
    async fn panicking_collection_search_fails_only_that_collection() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let topology = TopologyRegistry::default();
        let [a, b] = [
            topology.global_principles().clone(),
            topology.unified_index().clone(),
        ];
        store.insert_collection(a.clone());
        store.insert_hits(&b, vec![hit(&b, "b1", 0.7, &[])]);
        store.panic_search_for(a.clone());

        let executor = FanOutExecutor::new(Arc::new(store), FanOutOptions::default());
        let results = executor.execute(&ctx, vec![a.clone(), b.clone()], query(5)).await?;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].collection, a);
        match &results[0].outcome {
            CollectionOutcome::Failed(error) => {
                assert_eq!(error.code, ErrorCode::internal());
                assert_eq!(
                    error.metadata.get("collection").map(String::as_str),
                    Some(a.as_str())
                );
            },
            other => {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::internal(),
                    format!("expected failure, got {other:?}"),
                ));
            },
        }
        assert_eq!(results[1].collection, b);
        assert!(results[1].succeeded());
        Ok(())
    }

    #[tokio::test]
    async fn collection_searches_run_concurrently() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let project = ProjectName::parse("go-stdlib").map_err(ErrorEnvelope::from)?;
        let collections = TopologyRegistry::default()
            .project_collections(&project)
            .map_err(ErrorEnvelope::from)?
            .to_vec();
        for collection in &collections {
            store.insert_collection(collection.clone());
            store.delay_search_for(collection.clone(), Duration::from_millis(60));
        }

        let executor = FanOutExecutor::new(Arc::new(store), FanOutOptions::default());
        let started = std::time::Instant::now();
        let results = executor.execute(&ctx, collections, query(1)).await?;
        let elapsed = started.elapsed();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(CollectionResult::succeeded));
        // Run one after another, the three searches would take 180ms.
        assert!(elapsed < Duration::from_millis(150), "took {elapsed:?}");
        Ok(())
    }

    #[tokio::test]
    async fn slow_collection_times_out_as_failure() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let collection = TopologyRegistry::default().unified_index().clone();
        store.insert_collection(collection.clone());
        store.slow_search_for(collection.clone());
        let options = FanOutOptions {
            per_collection_timeout: Duration::from_millis(20),
            ..FanOutOptions::default()
        };

        let executor = FanOutExecutor::new(Arc::new(store), options);
        let results = executor.execute(&ctx, vec![collection], query(1)).await?;

        match &results[0].outcome {
            CollectionOutcome::Failed(error) => assert_eq!(error.code, ErrorCode::timeout()),
            other => {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::internal(),
                    format!("expected timeout, got {other:?}"),
                ));
            },
        }
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_request_fails_the_fanout() {
        let ctx = RequestContext::new_request();
        ctx.cancel();
        let store = FakeStore::new();
        let collection = TopologyRegistry::default().unified_index().clone();
        store.insert_collection(collection.clone());

        let executor = FanOutExecutor::new(Arc::new(store.clone()), FanOutOptions::default());
        let result = executor.execute(&ctx, vec![collection], query(1)).await;

        assert!(result.is_err_and(|error| error.is_cancelled()));
        assert_eq!(store.search_calls(), 0);
    }

    #[test]
    fn per_collection_limit_saturates() {
        let store = FakeStore::new();
        let executor = FanOutExecutor::new(
            Arc::new(store),
            FanOutOptions {
                over_fetch_factor: 10,
                ..FanOutOptions::default()
            },
        );
        assert_eq!(executor.per_collection_limit(u32::MAX), u32::MAX);
        assert_eq!(executor.per_collection_limit(10), 100);
    }
}
