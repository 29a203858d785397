//! Qdrant REST adapter.

use crate::vector_store::error::{
    PROVIDER, QdrantErrorContext, invalid_response, map_rest_error, map_rest_transport_error,
    timeout_error,
};
use knowledge_search_config::VectorStoreConfig;
use knowledge_search_domain::{
    CollectionId, CollectionInfo, CollectionSpec, DistanceMetric, HitMetadata, MetadataFilter,
    ScoredHit,
};
use knowledge_search_ports::{BoxFuture, VectorSearchQuery, VectorStoreInfo, VectorStorePort};
use knowledge_search_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

const API_KEY_HEADER: &str = "api-key";
const CONTENT_FIELD: &str = "content";
const DEFAULT_SEGMENT_NUMBER: u32 = 2;
const MAX_SEGMENT_SIZE: u64 = 1_000_000;

/// Qdrant REST adapter configuration.
#[derive(Debug, Clone)]
pub struct QdrantRestConfig {
    /// Base URL of the Qdrant REST API.
    pub url: Box<str>,
    /// Optional API key.
    pub api_key: Option<Box<str>>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl QdrantRestConfig {
    /// Build from the validated vector store config section.
    #[must_use]
    pub fn from_vector_store_config(config: &VectorStoreConfig) -> Self {
        Self {
            url: config.url.clone(),
            api_key: config
                .api_key
                .as_ref()
                .map(|key| key.expose().to_owned().into_boxed_str()),
            timeout_ms: config.timeout_ms,
        }
    }

    /// Validates configuration invariants for the REST adapter.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "Qdrant URL is required",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "Qdrant timeout must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct QdrantErrorBody {
    status: Option<QdrantErrorStatus>,
}

#[derive(Debug, Deserialize)]
struct QdrantErrorStatus {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExistsResult {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionsResult {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CollectionInfoResult {
    status: Option<String>,
    points_count: Option<u64>,
    vectors_count: Option<u64>,
    indexed_vectors_count: Option<u64>,
    segments_count: Option<u64>,
    disk_data_size: Option<u64>,
    ram_data_size: Option<u64>,
    config: Option<CollectionConfigResult>,
}

#[derive(Debug, Deserialize)]
struct CollectionConfigResult {
    params: Option<CollectionParamsResult>,
}

#[derive(Debug, Deserialize)]
struct CollectionParamsResult {
    vectors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: PointId,
    score: f32,
    payload: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PointId {
    Num(u64),
    Uuid(String),
}

impl PointId {
    fn into_boxed_str(self) -> Box<str> {
        match self {
            Self::Num(value) => value.to_string().into_boxed_str(),
            Self::Uuid(value) => value.into_boxed_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    vector: &'a [f32],
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    score_threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    with_payload: Value,
    with_vector: bool,
}

/// Qdrant REST vector store adapter.
#[derive(Clone)]
pub struct QdrantRestVectorStore {
    info: VectorStoreInfo,
    client: reqwest::Client,
    base_url: Box<str>,
    timeout: Duration,
}

impl QdrantRestVectorStore {
    /// Creates a Qdrant REST adapter instance from configuration.
    pub fn new(config: &QdrantRestConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.url.trim().trim_end_matches('/').to_owned();

        let mut headers = HeaderMap::new();
        if let Some(api_key) = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        {
            let mut value = HeaderValue::from_str(api_key).map_err(|_| {
                ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "Qdrant API key contains invalid header characters",
                )
            })?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("vector", "vdb_client_init_failed"),
                    format!("failed to build Qdrant client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        Ok(Self {
            info: VectorStoreInfo {
                provider: PROVIDER.into(),
                endpoint: base_url.clone().into_boxed_str(),
            },
            client,
            base_url: base_url.into_boxed_str(),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        body: Option<&Value>,
        error_ctx: &QdrantErrorContext,
    ) -> Result<(StatusCode, Vec<u8>)> {
        ctx.ensure_not_cancelled(error_ctx.operation)?;
        let url = format!("{}{path}", self.base_url);
        let request = self.client.request(method, &url);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };

        let response = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(error_ctx.operation)),
            res = tokio::time::timeout(self.timeout, request.send()) => res,
        };
        let response = match response {
            Ok(result) => result.map_err(|error| map_rest_transport_error(&error, error_ctx))?,
            Err(_) => return Err(timeout_error(error_ctx)),
        };

        let status = response.status();
        let payload = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled_error(error_ctx.operation)),
            res = response.bytes() => res.map_err(|error| map_rest_transport_error(&error, error_ctx))?,
        };
        Ok((status, payload.to_vec()))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        body: Option<&Value>,
        error_ctx: &QdrantErrorContext,
    ) -> Result<T> {
        let (status, payload) = self.send(ctx, method, path, body, error_ctx).await?;
        if !status.is_success() {
            return Err(map_rest_error(
                error_message(status, &payload),
                status.as_u16(),
                error_ctx,
            ));
        }

        let response: QdrantResponse<T> = serde_json::from_slice(&payload).map_err(|error| {
            invalid_response(format!("invalid Qdrant response: {error}"), error_ctx)
        })?;
        response
            .result
            .ok_or_else(|| invalid_response("Qdrant response is missing a result", error_ctx))
    }
}

impl VectorStorePort for QdrantRestVectorStore {
    fn info(&self) -> &VectorStoreInfo {
        &self.info
    }

    fn collection_exists(
        &self,
        ctx: &RequestContext,
        collection: CollectionId,
    ) -> BoxFuture<'_, Result<bool>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let error_ctx =
                QdrantErrorContext::collection("qdrant.collection_exists", collection.as_str());
            let path = format!("/collections/{}/exists", collection.as_str());
            let result: ExistsResult = self
                .request(&ctx, Method::GET, &path, None, &error_ctx)
                .await?;
            Ok(result.exists)
        })
    }

    fn create_collection(
        &self,
        ctx: &RequestContext,
        collection: CollectionId,
        spec: CollectionSpec,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let error_ctx =
                QdrantErrorContext::collection("qdrant.create_collection", collection.as_str());
            let path = format!("/collections/{}", collection.as_str());
            let body = create_collection_body(&spec);
            let _created: Value = self
                .request(&ctx, Method::PUT, &path, Some(&body), &error_ctx)
                .await?;
            Ok(())
        })
    }

    fn delete_collection(
        &self,
        ctx: &RequestContext,
        collection: CollectionId,
    ) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let error_ctx =
                QdrantErrorContext::collection("qdrant.delete_collection", collection.as_str());
            let path = format!("/collections/{}", collection.as_str());
            let _deleted: Value = self
                .request(&ctx, Method::DELETE, &path, None, &error_ctx)
                .await?;
            Ok(())
        })
    }

    fn search(
        &self,
        ctx: &RequestContext,
        query: VectorSearchQuery,
    ) -> BoxFuture<'_, Result<Vec<ScoredHit>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let error_ctx =
                QdrantErrorContext::collection("qdrant.search", query.collection.as_str());
            let path = format!("/collections/{}/points/search", query.collection.as_str());
            let body = search_body(&query).map_err(|error| {
                invalid_response(format!("failed to encode search body: {error}"), &error_ctx)
            })?;
            let points: Vec<ScoredPoint> = self
                .request(&ctx, Method::POST, &path, Some(&body), &error_ctx)
                .await?;
            Ok(points
                .into_iter()
                .map(|point| into_hit(point, &query.collection, query.with_content))
                .collect())
        })
    }

    fn collection_info(
        &self,
        ctx: &RequestContext,
        name: Box<str>,
    ) -> BoxFuture<'_, Result<CollectionInfo>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let error_ctx = QdrantErrorContext::collection("qdrant.collection_info", &name);
            let path = format!("/collections/{name}");
            let result: CollectionInfoResult = self
                .request(&ctx, Method::GET, &path, None, &error_ctx)
                .await?;
            Ok(into_collection_info(name, result))
        })
    }

    fn list_collections(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<Vec<Box<str>>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let error_ctx = QdrantErrorContext::store("qdrant.list_collections");
            let result: CollectionsResult = self
                .request(&ctx, Method::GET, "/collections", None, &error_ctx)
                .await?;
            Ok(result
                .collections
                .into_iter()
                .map(|collection| collection.name.into_boxed_str())
                .collect())
        })
    }

    fn health_check(&self, ctx: &RequestContext) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            let error_ctx = QdrantErrorContext::store("qdrant.health_check");
            let (status, payload) = self
                .send(&ctx, Method::GET, "/healthz", None, &error_ctx)
                .await?;
            if status.is_success() {
                return Ok(());
            }
            Err(map_rest_error(
                error_message(status, &payload),
                status.as_u16(),
                &error_ctx,
            ))
        })
    }
}

const fn distance_label(distance: DistanceMetric) -> &'static str {
    match distance {
        DistanceMetric::Cosine => "Cosine",
        DistanceMetric::Dot => "Dot",
        DistanceMetric::Euclid => "Euclid",
    }
}

fn create_collection_body(spec: &CollectionSpec) -> Value {
    json!({
        "vectors": {
            "size": spec.dimension,
            "distance": distance_label(spec.distance),
        },
        "hnsw_config": {
            "m": spec.index.m,
            "ef_construct": spec.index.ef_construct,
            "full_scan_threshold": spec.index.full_scan_threshold,
        },
        "optimizers_config": {
            "default_segment_number": DEFAULT_SEGMENT_NUMBER,
            "max_segment_size": MAX_SEGMENT_SIZE,
        },
    })
}

fn filter_body(filter: &MetadataFilter) -> Value {
    json!({ "must": filter.conditions() })
}

fn search_body(query: &VectorSearchQuery) -> serde_json::Result<Value> {
    let with_payload = if query.with_content {
        Value::Bool(true)
    } else {
        json!({ "exclude": [CONTENT_FIELD] })
    };
    serde_json::to_value(SearchBody {
        vector: &query.vector,
        limit: query.limit,
        score_threshold: query.score_threshold,
        filter: query.filter.as_ref().map(filter_body),
        with_payload,
        with_vector: false,
    })
}

fn into_hit(point: ScoredPoint, collection: &CollectionId, with_content: bool) -> ScoredHit {
    let mut payload = point.payload.unwrap_or_default();
    let content = payload.remove(CONTENT_FIELD);
    let content = if with_content {
        content.and_then(|value| match value {
            Value::String(text) => Some(text.into_boxed_str()),
            _ => None,
        })
    } else {
        None
    };
    let metadata: HitMetadata = payload.into_iter().collect();
    ScoredHit {
        id: point.id.into_boxed_str(),
        score: point.score,
        collection: collection.clone(),
        metadata,
        content,
    }
}

fn into_collection_info(name: Box<str>, result: CollectionInfoResult) -> CollectionInfo {
    let vectors = result
        .config
        .and_then(|config| config.params)
        .and_then(|params| params.vectors);
    let vector_size = vectors
        .as_ref()
        .and_then(|vectors| vectors.get("size"))
        .and_then(Value::as_u64)
        .and_then(|size| u32::try_from(size).ok());
    let distance = vectors
        .as_ref()
        .and_then(|vectors| vectors.get("distance"))
        .and_then(Value::as_str)
        .map(Box::from);
    let points_count = result.points_count.unwrap_or(0);

    CollectionInfo {
        name,
        status: result.status.unwrap_or_else(|| "unknown".to_owned()).into_boxed_str(),
        points_count,
        vectors_count: result
            .vectors_count
            .or(result.indexed_vectors_count)
            .unwrap_or(points_count),
        segments_count: result.segments_count.unwrap_or(0),
        disk_data_size: result.disk_data_size.unwrap_or(0),
        ram_data_size: result.ram_data_size.unwrap_or(0),
        vector_size,
        distance,
    }
}

fn error_message(status: StatusCode, payload: &[u8]) -> String {
    serde_json::from_slice::<QdrantErrorBody>(payload)
        .ok()
        .and_then(|body| body.status)
        .and_then(|status| status.error)
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(payload);
            let text = text.trim();
            if text.is_empty() {
                format!("Qdrant returned HTTP {}", status.as_u16())
            } else {
                format!("HTTP {}: {text}", status.as_u16())
            }
        })
}

fn cancelled_error(operation: &'static str) -> ErrorEnvelope {
    ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation)
}
