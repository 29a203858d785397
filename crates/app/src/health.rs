//! Service health report and collection overview.

use crate::lifecycle::CollectionLifecycleManager;
use knowledge_search_domain::{CollectionStatsSummary, EmbeddingStatus, HealthReport, ServiceSummary};
use knowledge_search_ports::{EmbeddingPort, LogFields, LoggerPort, TelemetryPort, error_payload};
use knowledge_search_shared::{RequestContext, Result, timeout_with_context};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const PROBE_TEXT: &str = "health check";

/// Dependencies required by the health report.
#[derive(Clone)]
pub struct HealthDeps {
    /// Collection lifecycle manager.
    pub lifecycle: CollectionLifecycleManager,
    /// Embedding adapter probed for readiness.
    pub embedding: Arc<dyn EmbeddingPort>,
    /// Static configuration summary.
    pub service: ServiceSummary,
    /// Deadline for the embedding probe.
    pub probe_timeout: Duration,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Optional telemetry sink, reported when it keeps totals.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Probe the store and the embedding provider.
///
/// Probe failures are reported in the document rather than returned;
/// only cancellation fails the call.
pub async fn health_report(ctx: &RequestContext, deps: &HealthDeps) -> Result<HealthReport> {
    ctx.ensure_not_cancelled("health.start")?;

    let vector_store_healthy = deps.lifecycle.health_check(ctx).await;
    let embedding = probe_embedding(ctx, deps).await?;

    let (collections, stats) = if vector_store_healthy {
        let collections = match deps.lifecycle.list_all(ctx).await {
            Ok(collections) => collections,
            Err(error) if error.is_cancelled() => return Err(error),
            Err(error) => {
                log_warn(deps, "health.collections.failed", "Listing collections failed", &error);
                Vec::new()
            },
        };
        let stats = match deps.lifecycle.stats_summary(ctx).await {
            Ok(stats) => Some(stats),
            Err(error) if error.is_cancelled() => return Err(error),
            Err(error) => {
                log_warn(deps, "health.stats.failed", "Collection statistics failed", &error);
                None
            },
        };
        (collections, stats)
    } else {
        (Vec::new(), None)
    };

    Ok(HealthReport {
        vector_store_healthy,
        embedding,
        collections,
        service: deps.service.clone(),
        stats,
        metrics: deps
            .telemetry
            .as_ref()
            .and_then(|telemetry| telemetry.snapshot()),
    })
}

/// Statistics for every collection the store knows.
pub async fn collections_overview(
    ctx: &RequestContext,
    lifecycle: &CollectionLifecycleManager,
) -> Result<CollectionStatsSummary> {
    ctx.ensure_not_cancelled("collections.overview")?;
    lifecycle.stats_summary(ctx).await
}

async fn probe_embedding(ctx: &RequestContext, deps: &HealthDeps) -> Result<EmbeddingStatus> {
    let info = deps.embedding.model_info();
    let probed = timeout_with_context(
        ctx,
        deps.probe_timeout,
        "health.embedding_probe",
        deps.embedding.embed(ctx, PROBE_TEXT.into()),
    )
    .await
    .and_then(|vector| vector.ensure_dimension(info.dimension));

    let ready = match probed {
        Ok(()) => true,
        Err(error) if error.is_cancelled() => return Err(error),
        Err(error) => {
            log_warn(deps, "health.embedding.failed", "Embedding probe failed", &error);
            false
        },
    };
    Ok(EmbeddingStatus {
        model: info.model.clone(),
        dimension: info.dimension,
        ready,
    })
}

fn log_warn(
    deps: &HealthDeps,
    event: &str,
    message: &str,
    error: &knowledge_search_shared::ErrorEnvelope,
) {
    if let Some(logger) = deps.logger.as_ref() {
        let mut fields = LogFields::new();
        fields.insert("error".into(), error_payload(error));
        fields.insert("store".into(), Value::from(&*deps.service.vector_store_url));
        logger.warn(event, message, Some(fields));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEmbedding, FakeStore, RecordingLogger, backend_error, spec};
    use knowledge_search_domain::{MetricsSnapshot, TopologyRegistry};
    use knowledge_search_ports::{TelemetryTags, TelemetryTimer};

    struct SnapshotTelemetry;

    struct NoopTimer;

    impl TelemetryTimer for NoopTimer {
        fn stop(&self) {}
    }

    impl TelemetryPort for SnapshotTelemetry {
        fn increment_counter(&self, _name: &str, _value: u64, _tags: Option<&TelemetryTags>) {}

        fn record_timer_ms(&self, _name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {}

        fn start_timer(&self, _name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
            Box::new(NoopTimer)
        }

        fn snapshot(&self) -> Option<MetricsSnapshot> {
            let mut snapshot = MetricsSnapshot::default();
            snapshot.counters.insert("search.requests".into(), 3);
            Some(snapshot)
        }
    }

    fn deps(store: &FakeStore, embedding: FakeEmbedding, logger: &RecordingLogger) -> HealthDeps {
        HealthDeps {
            lifecycle: CollectionLifecycleManager::new(
                Arc::new(store.clone()),
                Arc::new(TopologyRegistry::default()),
                spec(),
            ),
            embedding: Arc::new(embedding),
            service: ServiceSummary {
                embedding_model: "fake-mini".into(),
                vector_dimension: 4,
                vector_store_url: "http://store.test".into(),
            },
            probe_timeout: Duration::from_secs(1),
            logger: Some(Arc::new(logger.clone())),
            telemetry: Some(Arc::new(SnapshotTelemetry)),
        }
    }

    #[tokio::test]
    async fn healthy_report_lists_collections_and_metrics() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let topology = TopologyRegistry::default();
        store.insert_collection(topology.global_principles().clone());
        let logger = RecordingLogger::default();

        let report = health_report(&ctx, &deps(&store, FakeEmbedding::new(), &logger)).await?;

        assert!(report.is_healthy());
        assert_eq!(report.collections, vec![Box::from("global-principles")]);
        assert_eq!(report.collection_infos().len(), 1);
        assert_eq!(
            report
                .metrics
                .as_ref()
                .and_then(|metrics| metrics.counters.get("search.requests").copied()),
            Some(3)
        );
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_store_is_unhealthy_without_failing() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        store.set_unreachable();
        let logger = RecordingLogger::default();

        let report = health_report(&ctx, &deps(&store, FakeEmbedding::new(), &logger)).await?;

        assert!(!report.vector_store_healthy);
        assert!(report.embedding.ready);
        assert!(!report.is_healthy());
        assert!(report.collections.is_empty());
        assert_eq!(report.stats, None);
        Ok(())
    }

    #[tokio::test]
    async fn failing_embedding_is_not_ready() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let logger = RecordingLogger::default();
        let embedding = FakeEmbedding::failing(backend_error("model offline"));

        let report = health_report(&ctx, &deps(&store, embedding, &logger)).await?;

        assert!(!report.embedding.ready);
        assert!(!report.is_healthy());
        assert_eq!(logger.count("health.embedding.failed"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn overview_propagates_store_errors() {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        store.set_unreachable();
        let lifecycle = CollectionLifecycleManager::new(
            Arc::new(store),
            Arc::new(TopologyRegistry::default()),
            spec(),
        );

        assert!(collections_overview(&ctx, &lifecycle).await.is_err());
    }
}
