//! Search runtime: every service the HTTP surface needs, wired once.

use crate::InfraResult;
use crate::factory::{build_embedding_port, build_logger, build_vector_store_port};
use knowledge_search_adapters::InMemoryTelemetry;
use knowledge_search_app::{
    CollectionLifecycleManager, CollectionSetupReport, FanOutExecutor, FanOutOptions, HealthDeps,
    QueryRouter, SearchDeps, SearchService, SetupOutcome,
};
use knowledge_search_config::ValidatedSearchConfig;
use knowledge_search_domain::ServiceSummary;
use knowledge_search_ports::{
    EmbeddingPort, LogFields, LoggerPort, TelemetryPort, VectorStorePort, error_payload,
};
use knowledge_search_shared::RequestContext;
use serde_json::Value;
use std::sync::Arc;

/// Outcome counts of a collection bootstrap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    /// Collections created by this run.
    pub created: usize,
    /// Collections that were already present.
    pub existing: usize,
    /// Collections that could not be created.
    pub failed: usize,
}

impl BootstrapSummary {
    fn from_reports(reports: &[CollectionSetupReport]) -> Self {
        reports
            .iter()
            .fold(Self::default(), |mut summary, report| {
                match report.outcome {
                    SetupOutcome::Created => summary.created += 1,
                    SetupOutcome::AlreadyExists => summary.existing += 1,
                    SetupOutcome::Failed(_) => summary.failed += 1,
                }
                summary
            })
    }
}

/// Composition root shared by request handlers.
#[derive(Clone)]
pub struct SearchRuntime {
    config: Arc<ValidatedSearchConfig>,
    lifecycle: CollectionLifecycleManager,
    search: SearchService,
    health: HealthDeps,
    embedding: Arc<dyn EmbeddingPort>,
    logger: Arc<dyn LoggerPort>,
    telemetry: Arc<dyn TelemetryPort>,
}

impl SearchRuntime {
    /// Build adapters from config and wire the services.
    pub fn from_config(config: ValidatedSearchConfig) -> InfraResult<Self> {
        let embedding = build_embedding_port(&config)?;
        let store = build_vector_store_port(&config)?;
        Ok(Self::from_ports(config, store, embedding))
    }

    /// Wire the services around already-built ports.
    #[must_use]
    pub fn from_ports(
        config: ValidatedSearchConfig,
        store: Arc<dyn VectorStorePort>,
        embedding: Arc<dyn EmbeddingPort>,
    ) -> Self {
        let logger: Arc<dyn LoggerPort> = Arc::new(build_logger(&config));
        let telemetry: Arc<dyn TelemetryPort> = Arc::new(InMemoryTelemetry::new());
        let search_config = &config.as_ref().search;
        let max_concurrency = usize::try_from(search_config.max_concurrency).unwrap_or(usize::MAX);

        let lifecycle = CollectionLifecycleManager::new(
            Arc::clone(&store),
            Arc::new(config.topology().clone()),
            config.collection_spec(),
        )
        .with_logger(Arc::clone(&logger))
        .with_max_concurrency(max_concurrency);

        let router = QueryRouter::new(lifecycle.clone()).with_logger(Arc::clone(&logger));
        let fanout = FanOutExecutor::new(
            Arc::clone(&store),
            FanOutOptions {
                over_fetch_factor: search_config.over_fetch_factor,
                per_collection_timeout: config.per_collection_timeout(),
                max_concurrency,
            },
        );
        let search = SearchService::new(SearchDeps {
            embedding: Arc::clone(&embedding),
            router,
            fanout,
            logger: Some(Arc::clone(&logger)),
            telemetry: Some(Arc::clone(&telemetry)),
        });

        let health = HealthDeps {
            lifecycle: lifecycle.clone(),
            embedding: Arc::clone(&embedding),
            service: ServiceSummary {
                embedding_model: embedding.model_info().model.clone(),
                vector_dimension: config.as_ref().vector_store.vector_size,
                vector_store_url: store.info().endpoint.clone(),
            },
            probe_timeout: config.embedding_timeout(),
            logger: Some(Arc::clone(&logger)),
            telemetry: Some(Arc::clone(&telemetry)),
        };

        Self {
            config: Arc::new(config),
            lifecycle,
            search,
            health,
            embedding,
            logger,
            telemetry,
        }
    }

    /// Validated configuration.
    #[must_use]
    pub fn config(&self) -> &ValidatedSearchConfig {
        &self.config
    }

    /// Multi-collection search service.
    #[must_use]
    pub const fn search(&self) -> &SearchService {
        &self.search
    }

    /// Health report dependencies.
    #[must_use]
    pub const fn health(&self) -> &HealthDeps {
        &self.health
    }

    /// Collection lifecycle manager.
    #[must_use]
    pub const fn lifecycle(&self) -> &CollectionLifecycleManager {
        &self.lifecycle
    }

    /// Embedding port (used by the benchmark).
    #[must_use]
    pub fn embedding(&self) -> &dyn EmbeddingPort {
        self.embedding.as_ref()
    }

    /// Service logger.
    #[must_use]
    pub fn logger(&self) -> &dyn LoggerPort {
        self.logger.as_ref()
    }

    /// Telemetry sink backing `/health` metrics.
    #[must_use]
    pub fn telemetry(&self) -> &dyn TelemetryPort {
        self.telemetry.as_ref()
    }

    /// Create the global collections and those of every configured project.
    ///
    /// Individual failures are logged and counted; only cancellation and
    /// invalid project names fail the call.
    pub async fn bootstrap(&self, ctx: &RequestContext) -> InfraResult<BootstrapSummary> {
        let reports = self
            .lifecycle
            .setup_all(ctx, self.config.bootstrap_projects())
            .await?;

        for report in &reports {
            if let SetupOutcome::Failed(error) = &report.outcome {
                let mut fields = LogFields::new();
                fields.insert("collection".into(), Value::from(report.collection.as_str()));
                fields.insert("error".into(), error_payload(error));
                self.logger.warn(
                    "bootstrap.collection.failed",
                    "Collection could not be created",
                    Some(fields),
                );
            }
        }

        let summary = BootstrapSummary::from_reports(&reports);
        let mut fields = LogFields::new();
        fields.insert("created".into(), Value::from(summary.created));
        fields.insert("existing".into(), Value::from(summary.existing));
        fields.insert("failed".into(), Value::from(summary.failed));
        self.logger
            .info("bootstrap.completed", "Collection bootstrap finished", Some(fields));
        Ok(summary)
    }
}
