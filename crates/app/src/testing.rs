//! In-memory fakes for the port traits used by this crate's unit tests.

use knowledge_search_domain::{
    CollectionId, CollectionInfo, CollectionSpec, DistanceMetric, HitMetadata, IndexParams,
    ScoredHit,
};
use knowledge_search_ports::{
    BoxFuture, EmbedBatchRequest, EmbedRequest, EmbeddingModelInfo, EmbeddingPort,
    EmbeddingVector, LogEvent, LogFields, LoggerPort, TelemetryPort, TelemetryTags,
    TelemetryTimer, VectorSearchQuery, VectorStoreInfo, VectorStorePort,
};
use knowledge_search_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DIMENSION: u32 = 4;
pub const VECTORS_PER_COLLECTION: u64 = 7;

pub fn spec() -> CollectionSpec {
    CollectionSpec {
        dimension: DIMENSION,
        distance: DistanceMetric::Cosine,
        index: IndexParams::default(),
    }
}

fn poisoned(what: &str) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::internal(),
        format!("{what} lock poisoned"),
        ErrorClass::NonRetriable,
    )
}

pub fn backend_error(message: &str) -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::new("vector", "vdb_connection"),
        message,
        ErrorClass::Retriable,
    )
}

pub fn hit(collection: &CollectionId, id: &str, score: f32, metadata: &[(&str, &str)]) -> ScoredHit {
    let metadata: HitMetadata = metadata
        .iter()
        .map(|(key, value)| ((*key).to_owned(), Value::from(*value)))
        .collect();
    ScoredHit {
        id: id.into(),
        score,
        collection: collection.clone(),
        metadata,
        content: Some(format!("content of {id}").into_boxed_str()),
    }
}

#[derive(Default)]
struct StoreState {
    collections: BTreeSet<CollectionId>,
    hits: BTreeMap<CollectionId, Vec<ScoredHit>>,
    failing_search: BTreeSet<CollectionId>,
    failing_exists: BTreeSet<CollectionId>,
    slow_search: BTreeSet<CollectionId>,
    panicking_search: BTreeSet<CollectionId>,
    search_delays: BTreeMap<CollectionId, Duration>,
    fail_creates: bool,
    unreachable: bool,
    queries: Vec<VectorSearchQuery>,
}

struct SearchBehavior {
    slow: bool,
    panics: bool,
    delay: Option<Duration>,
}

/// Vector store fake backed by a shared in-memory state.
#[derive(Clone)]
pub struct FakeStore {
    info: VectorStoreInfo,
    state: Arc<Mutex<StoreState>>,
    create_calls: Arc<AtomicUsize>,
    search_calls: Arc<AtomicUsize>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            info: VectorStoreInfo {
                provider: "fake".into(),
                endpoint: "http://store.test".into(),
            },
            state: Arc::new(Mutex::new(StoreState::default())),
            create_calls: Arc::new(AtomicUsize::new(0)),
            search_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> Result<T> {
        let mut guard = self.state.lock().map_err(|_| poisoned("store state"))?;
        Ok(f(&mut guard))
    }

    fn update(&self, f: impl FnOnce(&mut StoreState)) {
        if let Ok(mut guard) = self.state.lock() {
            f(&mut guard);
        }
    }

    pub fn insert_collection(&self, collection: CollectionId) {
        self.update(|state| {
            state.collections.insert(collection);
        });
    }

    pub fn insert_hits(&self, collection: &CollectionId, hits: Vec<ScoredHit>) {
        self.update(|state| {
            state.collections.insert(collection.clone());
            state.hits.insert(collection.clone(), hits);
        });
    }

    pub fn fail_search_for(&self, collection: CollectionId) {
        self.update(|state| {
            state.failing_search.insert(collection);
        });
    }

    pub fn fail_exists_for(&self, collection: CollectionId) {
        self.update(|state| {
            state.failing_exists.insert(collection);
        });
    }

    pub fn slow_search_for(&self, collection: CollectionId) {
        self.update(|state| {
            state.slow_search.insert(collection);
        });
    }

    pub fn panic_search_for(&self, collection: CollectionId) {
        self.update(|state| {
            state.panicking_search.insert(collection);
        });
    }

    pub fn delay_search_for(&self, collection: CollectionId, delay: Duration) {
        self.update(|state| {
            state.search_delays.insert(collection, delay);
        });
    }

    pub fn fail_creates(&self) {
        self.update(|state| state.fail_creates = true);
    }

    pub fn set_unreachable(&self) {
        self.update(|state| state.unreachable = true);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Result<Vec<VectorSearchQuery>> {
        self.with_state(|state| state.queries.clone())
    }
}

impl VectorStorePort for FakeStore {
    fn info(&self) -> &VectorStoreInfo {
        &self.info
    }

    fn collection_exists(
        &self,
        _ctx: &RequestContext,
        collection: CollectionId,
    ) -> BoxFuture<'_, Result<bool>> {
        let result = self.with_state(|state| {
            if state.unreachable || state.failing_exists.contains(&collection) {
                return Err(backend_error("store unreachable"));
            }
            Ok(state.collections.contains(&collection))
        });
        Box::pin(async move { result? })
    }

    fn create_collection(
        &self,
        _ctx: &RequestContext,
        collection: CollectionId,
        _spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<()>> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.with_state(|state| {
            if state.fail_creates {
                return Err(backend_error("create rejected"));
            }
            state.collections.insert(collection);
            Ok(())
        });
        Box::pin(async move { result? })
    }

    fn delete_collection(
        &self,
        _ctx: &RequestContext,
        collection: CollectionId,
    ) -> BoxFuture<'_, Result<()>> {
        let result = self.with_state(|state| {
            state.collections.remove(&collection);
            state.hits.remove(&collection);
        });
        Box::pin(async move { result })
    }

    #[allow(clippy::panic, reason = "panicking search is a test hook")]
    fn search(
        &self,
        ctx: &RequestContext,
        query: VectorSearchQuery,
    ) -> BoxFuture<'_, Result<Vec<ScoredHit>>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let ctx = ctx.clone();
        let outcome = self.with_state(|state| {
            state.queries.push(query.clone());
            let behavior = SearchBehavior {
                slow: state.slow_search.contains(&query.collection),
                panics: state.panicking_search.contains(&query.collection),
                delay: state.search_delays.get(&query.collection).copied(),
            };
            if state.failing_search.contains(&query.collection) {
                return (behavior, Err(backend_error("search failed")));
            }
            let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
            let hits: Vec<ScoredHit> = state
                .hits
                .get(&query.collection)
                .map(|hits| {
                    hits.iter()
                        .filter(|hit| query.score_threshold.is_none_or(|min| hit.score >= min))
                        .take(limit)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            (behavior, Ok(hits))
        });
        Box::pin(async move {
            let (behavior, result) = outcome?;
            if let Some(delay) = behavior.delay {
                tokio::time::sleep(delay).await;
            }
            if behavior.panics {
                panic!("search task for {} panicked", query.collection.as_str());
            }
            if behavior.slow {
                tokio::select! {
                    () = ctx.cancelled() => return Err(ErrorEnvelope::cancelled("search cancelled")),
                    () = tokio::time::sleep(Duration::from_secs(5)) => {},
                }
            }
            result
        })
    }

    fn collection_info(
        &self,
        _ctx: &RequestContext,
        name: Box<str>,
    ) -> BoxFuture<'_, Result<CollectionInfo>> {
        let result = self.with_state(|state| {
            let known = state
                .collections
                .iter()
                .any(|collection| collection.as_str() == &*name);
            if !known {
                return Err(ErrorEnvelope::expected(
                    ErrorCode::not_found(),
                    "collection not found",
                ));
            }
            Ok(CollectionInfo {
                name: name.clone(),
                status: "green".into(),
                points_count: VECTORS_PER_COLLECTION,
                vectors_count: VECTORS_PER_COLLECTION,
                segments_count: 1,
                disk_data_size: 1024,
                ram_data_size: 512,
                vector_size: Some(DIMENSION),
                distance: Some("cosine".into()),
            })
        });
        Box::pin(async move { result? })
    }

    fn list_collections(&self, _ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<Box<str>>>> {
        let result = self.with_state(|state| {
            if state.unreachable {
                return Err(backend_error("store unreachable"));
            }
            Ok(state
                .collections
                .iter()
                .map(|collection| Box::from(collection.as_str()))
                .collect())
        });
        Box::pin(async move { result? })
    }

    fn health_check(&self, _ctx: &RequestContext) -> BoxFuture<'_, Result<()>> {
        let result = self.with_state(|state| {
            if state.unreachable {
                return Err(backend_error("store unreachable"));
            }
            Ok(())
        });
        Box::pin(async move { result? })
    }
}

/// Embedding fake returning a fixed vector.
#[derive(Clone)]
pub struct FakeEmbedding {
    info: EmbeddingModelInfo,
    vector: Arc<[f32]>,
    failure: Option<ErrorEnvelope>,
    calls: Arc<AtomicUsize>,
    batch_sizes: Arc<Mutex<Vec<usize>>>,
}

impl FakeEmbedding {
    pub fn new() -> Self {
        Self {
            info: EmbeddingModelInfo {
                provider: "fake".into(),
                model: "fake-mini".into(),
                dimension: DIMENSION,
            },
            vector: Arc::from(vec![0.5; DIMENSION as usize]),
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: ErrorEnvelope) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    pub fn with_vector(vector: Vec<f32>) -> Self {
        Self {
            vector: Arc::from(vector),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Result<Vec<usize>> {
        let guard = self.batch_sizes.lock().map_err(|_| poisoned("batch sizes"))?;
        Ok(guard.clone())
    }
}

impl EmbeddingPort for FakeEmbedding {
    fn model_info(&self) -> &EmbeddingModelInfo {
        &self.info
    }

    fn embed(
        &self,
        _ctx: &RequestContext,
        _request: EmbedRequest,
    ) -> BoxFuture<'_, Result<EmbeddingVector>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let vector = Arc::clone(&self.vector);
        let failure = self.failure.clone();
        Box::pin(async move {
            match failure {
                Some(error) => Err(error),
                None => Ok(EmbeddingVector::new(vector)),
            }
        })
    }

    fn embed_batch(
        &self,
        _ctx: &RequestContext,
        request: EmbedBatchRequest,
    ) -> BoxFuture<'_, Result<Vec<EmbeddingVector>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let count = request.texts.len();
        if let Ok(mut guard) = self.batch_sizes.lock() {
            guard.push(count);
        }
        let vector = Arc::clone(&self.vector);
        let failure = self.failure.clone();
        Box::pin(async move {
            match failure {
                Some(error) => Err(error),
                None => Ok((0..count)
                    .map(|_| EmbeddingVector::new(Arc::clone(&vector)))
                    .collect()),
            }
        })
    }
}

/// Logger fake that records every event name.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl RecordingLogger {
    pub fn count(&self, event: &str) -> usize {
        self.events
            .lock()
            .map(|events| events.iter().filter(|logged| &*logged.event == event).count())
            .unwrap_or(0)
    }

    pub fn events(&self) -> Result<Vec<LogEvent>> {
        let guard = self.events.lock().map_err(|_| poisoned("log events"))?;
        Ok(guard.clone())
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, event: LogEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(self.clone())
    }
}

struct NoopTimer;

impl TelemetryTimer for NoopTimer {
    fn stop(&self) {}
}

/// Telemetry fake summing counters by name.
#[derive(Clone, Default)]
pub struct RecordingTelemetry {
    counters: Arc<Mutex<BTreeMap<String, u64>>>,
    timers: Arc<Mutex<Vec<String>>>,
}

impl RecordingTelemetry {
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .map(|counters| counters.get(name).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn timer_count(&self, name: &str) -> usize {
        self.timers
            .lock()
            .map(|timers| timers.iter().filter(|timer| timer.as_str() == name).count())
            .unwrap_or(0)
    }
}

impl TelemetryPort for RecordingTelemetry {
    fn increment_counter(&self, name: &str, value: u64, _tags: Option<&TelemetryTags>) {
        if let Ok(mut guard) = self.counters.lock() {
            *guard.entry(name.to_owned()).or_insert(0) += value;
        }
    }

    fn record_timer_ms(&self, name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {
        if let Ok(mut guard) = self.timers.lock() {
            guard.push(name.to_owned());
        }
    }

    fn start_timer(&self, _name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(NoopTimer)
    }
}
