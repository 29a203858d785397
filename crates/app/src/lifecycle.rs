//! Collection lifecycle: idempotent create, delete, stats, and health.

use knowledge_search_domain::{
    CollectionId, CollectionInfo, CollectionSpec, CollectionStatsSummary, ProjectName,
    TopologyRegistry,
};
use knowledge_search_ports::{LogFields, LoggerPort, VectorStorePort, error_payload};
use knowledge_search_shared::{ErrorEnvelope, RequestContext, Result, WorkerPool, WorkerPoolOptions};
use serde_json::Value;
use std::sync::Arc;

/// Result of creating one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The collection was created by this call.
    Created,
    /// The collection was already present.
    AlreadyExists,
    /// The store rejected the request.
    Failed(ErrorEnvelope),
}

impl SetupOutcome {
    /// Whether the collection exists after the call.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Created | Self::AlreadyExists)
    }
}

/// Per-collection entry of a setup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSetupReport {
    /// Target collection.
    pub collection: CollectionId,
    /// What happened.
    pub outcome: SetupOutcome,
}

/// Creates, inspects, and removes the collections named by the topology.
///
/// Cheap to clone; clones share the same store handle.
#[derive(Clone)]
pub struct CollectionLifecycleManager {
    store: Arc<dyn VectorStorePort>,
    topology: Arc<TopologyRegistry>,
    spec: CollectionSpec,
    max_concurrency: usize,
    logger: Option<Arc<dyn LoggerPort>>,
}

impl CollectionLifecycleManager {
    /// Build a manager over `store`. New collections use `spec`.
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStorePort>,
        topology: Arc<TopologyRegistry>,
        spec: CollectionSpec,
    ) -> Self {
        Self {
            store,
            topology,
            spec,
            max_concurrency: 16,
            logger: None,
        }
    }

    /// Attach a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn LoggerPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Bound the number of concurrent existence checks.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Topology the manager resolves names through.
    #[must_use]
    pub fn topology(&self) -> &TopologyRegistry {
        &self.topology
    }

    /// Parameters used for new collections.
    #[must_use]
    pub const fn spec(&self) -> CollectionSpec {
        self.spec
    }

    /// Whether `collection` exists.
    pub async fn exists(&self, ctx: &RequestContext, collection: &CollectionId) -> Result<bool> {
        self.store.collection_exists(ctx, collection.clone()).await
    }

    /// Check many collections concurrently, keeping input order.
    ///
    /// Each entry carries its own result so one failing check does not hide
    /// the others. Cancellation fails the whole call.
    pub async fn exists_many(
        &self,
        ctx: &RequestContext,
        collections: Vec<CollectionId>,
    ) -> Result<Vec<(CollectionId, Result<bool>)>> {
        if collections.is_empty() {
            return Ok(Vec::new());
        }
        let pool = WorkerPool::new(
            ctx.clone(),
            WorkerPoolOptions {
                concurrency: self.max_concurrency,
            },
        )?;
        let store = Arc::clone(&self.store);
        let task_ctx = ctx.clone();
        pool.map(collections, move |collection: CollectionId, _index| {
            let store = Arc::clone(&store);
            let ctx = task_ctx.clone();
            async move {
                let exists = store.collection_exists(&ctx, collection.clone()).await;
                match exists {
                    Err(error) if error.is_cancelled() => Err(error),
                    other => Ok((collection, other)),
                }
            }
        })
        .await
    }

    /// Create `collection` unless it already exists.
    ///
    /// A create that loses a race with another creator reports
    /// [`SetupOutcome::AlreadyExists`].
    pub async fn create(
        &self,
        ctx: &RequestContext,
        collection: &CollectionId,
    ) -> Result<SetupOutcome> {
        if self.exists(ctx, collection).await? {
            self.log_info(
                "lifecycle.create.exists",
                "Collection already exists",
                collection,
            );
            return Ok(SetupOutcome::AlreadyExists);
        }

        match self
            .store
            .create_collection(ctx, collection.clone(), self.spec)
            .await
        {
            Ok(()) => {
                self.log_info("lifecycle.create.created", "Collection created", collection);
                Ok(SetupOutcome::Created)
            },
            Err(error) if error.is_cancelled() => Err(error),
            Err(error) => {
                if self.exists(ctx, collection).await.unwrap_or(false) {
                    self.log_info(
                        "lifecycle.create.exists",
                        "Collection created concurrently",
                        collection,
                    );
                    return Ok(SetupOutcome::AlreadyExists);
                }
                Err(error)
            },
        }
    }

    /// Delete `collection`. Returns `false` when it did not exist.
    pub async fn delete(&self, ctx: &RequestContext, collection: &CollectionId) -> Result<bool> {
        if !self.exists(ctx, collection).await? {
            self.log_info(
                "lifecycle.delete.missing",
                "Collection not found; nothing to delete",
                collection,
            );
            return Ok(false);
        }
        self.store.delete_collection(ctx, collection.clone()).await?;
        self.log_info("lifecycle.delete.deleted", "Collection deleted", collection);
        Ok(true)
    }

    /// Statistics for one collection.
    pub async fn stats(
        &self,
        ctx: &RequestContext,
        collection: &CollectionId,
    ) -> Result<CollectionInfo> {
        self.collection_info(ctx, collection.as_str()).await
    }

    /// Statistics for a collection by its store name.
    pub async fn collection_info(&self, ctx: &RequestContext, name: &str) -> Result<CollectionInfo> {
        self.store.collection_info(ctx, name.into()).await
    }

    /// Whether the store can be reached at all.
    pub async fn health_check(&self, ctx: &RequestContext) -> bool {
        match self.store.health_check(ctx).await {
            Ok(()) => true,
            Err(error) => {
                if let Some(logger) = self.logger.as_ref() {
                    let mut fields = LogFields::new();
                    fields.insert("endpoint".into(), Value::from(&*self.store.info().endpoint));
                    fields.insert("error".into(), error_payload(&error));
                    logger.warn(
                        "lifecycle.health.failed",
                        "Vector store health check failed",
                        Some(fields),
                    );
                }
                false
            },
        }
    }

    /// Every collection the store knows, by name.
    pub async fn list_all(&self, ctx: &RequestContext) -> Result<Vec<Box<str>>> {
        self.store.list_collections(ctx).await
    }

    /// Totals across every collection the store knows.
    ///
    /// Collections whose statistics cannot be read are logged and left out.
    pub async fn stats_summary(&self, ctx: &RequestContext) -> Result<CollectionStatsSummary> {
        let names = self.list_all(ctx).await?;
        let mut infos = Vec::with_capacity(names.len());
        for name in names {
            match self.store.collection_info(ctx, name.clone()).await {
                Ok(info) => infos.push(info),
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => {
                    if let Some(logger) = self.logger.as_ref() {
                        let mut fields = LogFields::new();
                        fields.insert("collection".into(), Value::from(&*name));
                        fields.insert("error".into(), error_payload(&error));
                        logger.warn(
                            "lifecycle.stats.failed",
                            "Collection statistics unavailable",
                            Some(fields),
                        );
                    }
                },
            }
        }
        Ok(CollectionStatsSummary::from_collections(infos))
    }

    /// Create both global collections.
    pub async fn setup_global(&self, ctx: &RequestContext) -> Result<Vec<CollectionSetupReport>> {
        let targets = self.topology.global_collections().to_vec();
        self.setup_each(ctx, targets).await
    }

    /// Create the three collections of `project`.
    pub async fn setup_project(
        &self,
        ctx: &RequestContext,
        project: &ProjectName,
    ) -> Result<Vec<CollectionSetupReport>> {
        let targets = self
            .topology
            .project_collections(project)
            .map_err(ErrorEnvelope::from)?
            .to_vec();
        self.setup_each(ctx, targets).await
    }

    /// Create the global collections and those of every project.
    pub async fn setup_all(
        &self,
        ctx: &RequestContext,
        projects: &[ProjectName],
    ) -> Result<Vec<CollectionSetupReport>> {
        let mut reports = self.setup_global(ctx).await?;
        for project in projects {
            reports.extend(self.setup_project(ctx, project).await?);
        }
        Ok(reports)
    }

    /// Delete the three collections of `project`; returns how many existed.
    pub async fn cleanup_project(
        &self,
        ctx: &RequestContext,
        project: &ProjectName,
    ) -> Result<usize> {
        let targets = self
            .topology
            .project_collections(project)
            .map_err(ErrorEnvelope::from)?
            .to_vec();
        let mut deleted = 0;
        for collection in &targets {
            if self.delete(ctx, collection).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn setup_each(
        &self,
        ctx: &RequestContext,
        targets: Vec<CollectionId>,
    ) -> Result<Vec<CollectionSetupReport>> {
        let mut reports = Vec::with_capacity(targets.len());
        for collection in targets {
            let outcome = match self.create(ctx, &collection).await {
                Ok(outcome) => outcome,
                Err(error) if error.is_cancelled() => return Err(error),
                Err(error) => {
                    if let Some(logger) = self.logger.as_ref() {
                        let mut fields = LogFields::new();
                        fields.insert("collection".into(), Value::from(collection.as_str()));
                        fields.insert("error".into(), error_payload(&error));
                        logger.error(
                            "lifecycle.create.failed",
                            "Collection creation failed",
                            Some(fields),
                        );
                    }
                    SetupOutcome::Failed(error)
                },
            };
            reports.push(CollectionSetupReport {
                collection,
                outcome,
            });
        }
        Ok(reports)
    }

    fn log_info(&self, event: &str, message: &str, collection: &CollectionId) {
        if let Some(logger) = self.logger.as_ref() {
            let mut fields = LogFields::new();
            fields.insert("collection".into(), Value::from(collection.as_str()));
            logger.info(event, message, Some(fields));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, RecordingLogger, spec};

    fn manager(store: &FakeStore) -> CollectionLifecycleManager {
        CollectionLifecycleManager::new(
            Arc::new(store.clone()),
            Arc::new(TopologyRegistry::default()),
            spec(),
        )
    }

    #[tokio::test]
    async fn create_is_idempotent() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let manager = manager(&store);
        let target = manager.topology().global_principles().clone();

        assert_eq!(manager.create(&ctx, &target).await?, SetupOutcome::Created);
        assert_eq!(
            manager.create(&ctx, &target).await?,
            SetupOutcome::AlreadyExists
        );
        assert_eq!(store.create_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn setup_all_reports_every_collection() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let logger = RecordingLogger::default();
        let manager = manager(&store).with_logger(Arc::new(logger.clone()));
        let project = ProjectName::parse("go-stdlib").map_err(ErrorEnvelope::from)?;
        store.insert_collection(manager.topology().unified_index().clone());

        let reports = manager.setup_all(&ctx, &[project]).await?;

        assert_eq!(reports.len(), 5);
        assert!(reports.iter().all(|report| report.outcome.is_ok()));
        let existing = reports
            .iter()
            .filter(|report| report.outcome == SetupOutcome::AlreadyExists)
            .count();
        assert_eq!(existing, 1);
        assert_eq!(logger.count("lifecycle.create.created"), 4);
        Ok(())
    }

    #[tokio::test]
    async fn failed_creation_is_reported_not_raised() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        store.fail_creates();
        let manager = manager(&store);

        let reports = manager.setup_global(&ctx).await?;

        assert_eq!(reports.len(), 2);
        assert!(
            reports
                .iter()
                .all(|report| matches!(report.outcome, SetupOutcome::Failed(_)))
        );
        Ok(())
    }

    #[tokio::test]
    async fn cleanup_ignores_missing_collections() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let manager = manager(&store);
        let project = ProjectName::parse("alpha").map_err(ErrorEnvelope::from)?;
        let collections = manager
            .topology()
            .project_collections(&project)
            .map_err(ErrorEnvelope::from)?;
        store.insert_collection(collections.to_vec().remove(0));

        assert_eq!(manager.cleanup_project(&ctx, &project).await?, 1);
        assert_eq!(manager.cleanup_project(&ctx, &project).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn health_check_reports_unreachable_store() {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        store.set_unreachable();
        let logger = RecordingLogger::default();
        let manager = manager(&store).with_logger(Arc::new(logger.clone()));

        assert!(!manager.health_check(&ctx).await);
        assert_eq!(logger.count("lifecycle.health.failed"), 1);
    }

    #[tokio::test]
    async fn stats_summary_totals_known_collections() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let manager = manager(&store);
        store.insert_collection(manager.topology().global_principles().clone());
        store.insert_collection(manager.topology().unified_index().clone());

        let summary = manager.stats_summary(&ctx).await?;

        assert_eq!(summary.total_collections, 2);
        assert_eq!(summary.total_vectors, 2 * crate::testing::VECTORS_PER_COLLECTION);
        Ok(())
    }

    #[tokio::test]
    async fn exists_many_keeps_order_and_isolates_errors() -> Result<()> {
        let ctx = RequestContext::new_request();
        let store = FakeStore::new();
        let manager = manager(&store);
        let globals = manager.topology().global_collections().to_vec();
        store.insert_collection(globals[0].clone());
        store.fail_exists_for(globals[1].clone());

        let checked = manager.exists_many(&ctx, globals.clone()).await?;

        assert_eq!(checked.len(), 2);
        assert_eq!(checked[0].0, globals[0]);
        assert_eq!(checked[0].1, Ok(true));
        assert!(checked[1].1.is_err());
        Ok(())
    }
}
