//! Multi-collection search use-case: route, embed, fan out, merge, aggregate.

use crate::aggregator::aggregate;
use crate::fanout::{CollectionOutcome, CollectionResult, FanOutExecutor, FanOutQuery};
use crate::merger::merge_results;
use crate::router::{QueryRouter, RoutePlan};
use knowledge_search_domain::{ScoredHit, SearchRequest, SearchResponse};
use knowledge_search_ports::{
    EmbeddingPort, EmbeddingVector, LogFields, LoggerPort, TelemetryPort, TelemetryTags,
    error_payload, telemetry_tags,
};
use knowledge_search_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Dependencies required by the search use-case.
#[derive(Clone)]
pub struct SearchDeps {
    /// Query embedding adapter.
    pub embedding: Arc<dyn EmbeddingPort>,
    /// Collection router.
    pub router: QueryRouter,
    /// Per-collection executor.
    pub fanout: FanOutExecutor,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Searches every collection a request routes to and returns one ranking.
#[derive(Clone)]
pub struct SearchService {
    deps: SearchDeps,
}

impl SearchService {
    /// Build the service.
    #[must_use]
    pub const fn new(deps: SearchDeps) -> Self {
        Self { deps }
    }

    /// Dependencies the service was built with.
    #[must_use]
    pub const fn deps(&self) -> &SearchDeps {
        &self.deps
    }

    /// Execute `request`.
    ///
    /// Missing collections and individual collection failures reduce the
    /// result set. The call fails when the query cannot be embedded or when
    /// every routed collection failed.
    pub async fn search(
        &self,
        ctx: &RequestContext,
        request: &SearchRequest,
    ) -> Result<SearchResponse> {
        let started_at = Instant::now();
        let tags = telemetry_tags([("mode", request.mode().as_str())]);
        if let Some(telemetry) = self.deps.telemetry.as_ref() {
            telemetry.increment_counter("search.requests", 1, Some(&tags));
        }
        if let Some(logger) = self.deps.logger.as_ref() {
            logger.info(
                "search.request.start",
                "Search started",
                Some(log_fields_start(request)),
            );
        }

        let result = self.run(ctx, request, started_at, &tags).await;

        if let Some(telemetry) = self.deps.telemetry.as_ref() {
            telemetry.record_timer_ms("search.latency_ms", duration_ms(started_at), Some(&tags));
        }

        match result {
            Ok(response) => {
                if let Some(logger) = self.deps.logger.as_ref() {
                    logger.info(
                        "search.request.completed",
                        "Search completed",
                        Some(log_fields_completed(request, &response)),
                    );
                }
                Ok(response)
            },
            Err(error) => {
                if let Some(logger) = self.deps.logger.as_ref() {
                    let mut fields = log_fields_start(request);
                    fields.insert("durationMs".into(), Value::from(duration_ms(started_at)));
                    fields.insert("error".into(), error_payload(&error));
                    if error.is_cancelled() {
                        logger.info("search.request.aborted", "Search aborted", Some(fields));
                    } else {
                        logger.error("search.request.failed", "Search failed", Some(fields));
                    }
                }
                Err(error)
            },
        }
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        request: &SearchRequest,
        started_at: Instant,
        tags: &TelemetryTags,
    ) -> Result<SearchResponse> {
        ctx.ensure_not_cancelled("search.start")?;

        let plan = self.deps.router.route(ctx, request).await?;
        if plan.searchable.is_empty() && plan.unchecked.is_empty() {
            self.count("search.collections.skipped", plan.skipped.len(), tags);
            return Ok(SearchResponse::no_collections(
                request.query(),
                elapsed_ms(started_at),
            ));
        }

        let embedding = self.embed_query(ctx, request).await?;
        let RoutePlan {
            searchable,
            skipped,
            unchecked,
        } = plan;
        let mut results = self
            .deps
            .fanout
            .execute(
                ctx,
                searchable,
                FanOutQuery {
                    vector: Arc::clone(embedding.vector()),
                    limit: request.limit(),
                    score_threshold: request.score_threshold(),
                    filter: request.metadata_filter(),
                    with_content: request.include_content(),
                },
            )
            .await?;
        results.extend(unchecked.into_iter().map(|(collection, error)| CollectionResult {
            collection,
            outcome: CollectionOutcome::Failed(error),
        }));
        results.extend(skipped.into_iter().map(|collection| CollectionResult {
            collection,
            outcome: CollectionOutcome::Skipped,
        }));

        self.report_failures(&results, tags)?;

        if !request.include_content() {
            strip_content(&mut results);
        }
        let merged = merge_results(results, request.limit());
        let aggregations = aggregate(&merged.hits);
        self.count("search.hits.returned", merged.hits.len(), tags);

        Ok(SearchResponse {
            query: request.query().into(),
            hits: merged.hits,
            total_found: merged.total_found,
            processing_time_ms: elapsed_ms(started_at),
            search_strategy: SearchResponse::multi_collection_strategy(request.mode()),
            collections_searched: merged.collections_searched,
            aggregations,
        })
    }

    async fn embed_query(
        &self,
        ctx: &RequestContext,
        request: &SearchRequest,
    ) -> Result<EmbeddingVector> {
        ctx.ensure_not_cancelled("search.embed")?;

        let info = self.deps.embedding.model_info();
        let embed_tags = telemetry_tags([("model", &*info.model)]);
        let timer = self
            .deps
            .telemetry
            .as_ref()
            .map(|telemetry| telemetry.start_timer("search.embed", Some(&embed_tags)));
        let embedded = self.deps.embedding.embed(ctx, request.query().into()).await;
        if let Some(timer) = timer.as_ref() {
            timer.stop();
        }

        let embedding = embedded.map_err(|error| {
            if error.is_cancelled() {
                error
            } else {
                embedding_failed(&error)
            }
        })?;
        embedding.ensure_dimension(info.dimension)?;
        Ok(embedding)
    }

    fn report_failures(&self, results: &[CollectionResult], tags: &TelemetryTags) -> Result<()> {
        let mut failed = 0_usize;
        let mut skipped = 0_usize;
        for result in results {
            match &result.outcome {
                CollectionOutcome::Failed(error) => {
                    failed += 1;
                    if let Some(logger) = self.deps.logger.as_ref() {
                        let mut fields = LogFields::new();
                        fields.insert(
                            "collection".into(),
                            Value::from(result.collection.as_str()),
                        );
                        fields.insert("error".into(), error_payload(error));
                        logger.warn(
                            "search.fanout.collection_failed",
                            "Collection search failed; continuing without it",
                            Some(fields),
                        );
                    }
                },
                CollectionOutcome::Skipped => skipped += 1,
                CollectionOutcome::Succeeded(_) => {},
            }
        }
        self.count("search.collections.failed", failed, tags);
        self.count("search.collections.skipped", skipped, tags);

        let any_succeeded = results.iter().any(CollectionResult::succeeded);
        if failed == 0 || any_succeeded {
            return Ok(());
        }

        if let Some(logger) = self.deps.logger.as_ref() {
            let mut fields = LogFields::new();
            fields.insert("failedCollections".into(), Value::from(failed));
            logger.error(
                "search.fanout.all_failed",
                "Every routed collection failed",
                Some(fields),
            );
        }
        Err(ErrorEnvelope::unexpected(
            ErrorCode::backend_unavailable(),
            "all backends unavailable: every routed collection failed",
            ErrorClass::Retriable,
        )
        .with_metadata("failedCollections", failed.to_string()))
    }

    fn count(&self, name: &str, value: usize, tags: &TelemetryTags) {
        if value == 0 {
            return;
        }
        if let Some(telemetry) = self.deps.telemetry.as_ref() {
            telemetry.increment_counter(
                name,
                u64::try_from(value).unwrap_or(u64::MAX),
                Some(tags),
            );
        }
    }
}

fn embedding_failed(cause: &ErrorEnvelope) -> ErrorEnvelope {
    let mut error = ErrorEnvelope::unexpected(
        ErrorCode::embedding_failed(),
        format!("query embedding failed: {}", cause.message),
        cause.class,
    )
    .with_metadata(
        "cause",
        format!("{}:{}", cause.code.namespace(), cause.code.code()),
    );
    for (key, value) in &cause.metadata {
        error = error.with_metadata(key.clone(), value.clone());
    }
    error
}

fn strip_content(results: &mut [CollectionResult]) {
    for result in results {
        if let CollectionOutcome::Succeeded(hits) = &mut result.outcome {
            hits.iter_mut().for_each(|hit: &mut ScoredHit| hit.content = None);
        }
    }
}

fn duration_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn elapsed_ms(started_at: Instant) -> f64 {
    started_at.elapsed().as_secs_f64() * 1000.0
}

fn log_fields_start(request: &SearchRequest) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("scope".into(), Value::from(request.scope().as_str()));
    fields.insert("mode".into(), Value::from(request.mode().as_str()));
    fields.insert(
        "projects".into(),
        Value::from(
            request
                .projects()
                .iter()
                .map(|project| project.as_str().to_owned())
                .collect::<Vec<_>>(),
        ),
    );
    fields.insert("limit".into(), Value::from(request.limit()));
    fields.insert(
        "scoreThreshold".into(),
        Value::from(f64::from(request.score_threshold())),
    );
    fields.insert("queryLength".into(), Value::from(request.query().len()));
    fields
}

fn log_fields_completed(request: &SearchRequest, response: &SearchResponse) -> LogFields {
    let mut fields = log_fields_start(request);
    fields.insert("durationMs".into(), Value::from(response.processing_time_ms));
    fields.insert("results".into(), Value::from(response.hits.len()));
    fields.insert("totalFound".into(), Value::from(response.total_found));
    fields.insert(
        "collectionsSearched".into(),
        Value::from(response.collections_searched.len()),
    );
    fields.insert(
        "strategy".into(),
        Value::from(response.search_strategy.as_ref()),
    );
    fields
}
