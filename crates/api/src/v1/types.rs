//! API v1 DTO types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Error kind exposed in API v1 responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiV1ErrorKind {
    /// Expected, user-facing errors (validation, cancellation, degraded backends).
    Expected,
    /// Invariant violations that indicate a bug.
    Invariant,
}

/// API v1 error code string (stable contract value).
pub type ApiV1ErrorCode = String;

/// Metadata map attached to API v1 errors.
pub type ApiV1ErrorMeta = BTreeMap<String, String>;

/// API v1 error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1ErrorDto {
    /// Stable error code (e.g. `ERR_DOMAIN_CONTENT_TYPE_UNKNOWN`).
    pub code: ApiV1ErrorCode,
    /// Human-readable message for the caller.
    pub message: String,
    /// Error category.
    pub kind: ApiV1ErrorKind,
    /// Optional metadata for debugging and correlation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ApiV1ErrorMeta>,
}

/// API v1 result wrapper for success or failure payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiV1Result<T> {
    /// Success response.
    Ok {
        /// Indicates success.
        ok: bool,
        /// Success payload.
        data: T,
    },
    /// Error response.
    Err {
        /// Indicates failure.
        ok: bool,
        /// Error payload.
        error: ApiV1ErrorDto,
    },
}

impl<T> ApiV1Result<T> {
    /// Build a success response wrapper.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self::Ok { ok: true, data }
    }

    /// Build an error response wrapper.
    #[must_use]
    pub const fn err(error: ApiV1ErrorDto) -> Self {
        Self::Err { ok: false, error }
    }
}

/// Defaults applied to search requests that omit limit or threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApiV1SearchDefaults {
    /// Result limit.
    pub limit: u32,
    /// Minimum similarity score.
    pub score_threshold: f32,
}

impl Default for ApiV1SearchDefaults {
    fn default() -> Self {
        Self {
            limit: knowledge_search_domain::DEFAULT_LIMIT,
            score_threshold: knowledge_search_domain::DEFAULT_SCORE_THRESHOLD,
        }
    }
}

/// API v1 search request payload (`POST /search`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiV1SearchRequestDto {
    /// Search query text.
    pub query: String,
    /// Projects to search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<String>>,
    /// Content types to restrict project collections to
    /// (`framework`, `requirement`, `principle`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_types: Option<Vec<String>>,
    /// `project`, `global`, or `all` (default).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// `semantic`, `hybrid` (default), or `contextual`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Maximum results to return (1..=100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Minimum similarity score (0.0..=1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
    /// Include full content in results (default true).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_content: Option<bool>,
    /// Framework filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    /// Hierarchy level filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_levels: Option<Vec<String>>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiV1SearchResultDto {
    /// Document identifier.
    pub id: String,
    /// Document content; absent when `include_content` is false.
    #[serde(default)]
    pub content: Option<String>,
    /// Payload metadata, without the content.
    pub metadata: BTreeMap<String, Value>,
    /// Similarity score.
    pub score: f32,
    /// Collection the hit came from.
    pub collection: String,
    /// Highlighted fragments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
}

/// Facet counts over the returned results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiV1AggregationsDto {
    /// Counts by content type.
    pub content_types: BTreeMap<String, u64>,
    /// Counts by framework.
    pub frameworks: BTreeMap<String, u64>,
    /// Counts by project.
    pub projects: BTreeMap<String, u64>,
    /// Counts by hierarchy level.
    pub hierarchy_levels: BTreeMap<String, u64>,
}

/// API v1 search response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ApiV1SearchResponseDto {
    /// Query text as searched.
    pub query: String,
    /// Results ordered by score, descending.
    pub results: Vec<ApiV1SearchResultDto>,
    /// Hits found before truncation to `limit`.
    pub total_found: u64,
    /// Server-side processing time.
    pub processing_time_ms: f64,
    /// Strategy label.
    pub search_strategy: String,
    /// Collections that answered.
    pub collections_searched: Vec<String>,
    /// Facet counts over `results`.
    pub aggregations: ApiV1AggregationsDto,
}

/// Overall health label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiV1HealthStatus {
    /// Store reachable and embedding provider ready.
    Healthy,
    /// Anything else.
    Unhealthy,
}

/// Embedding provider readiness label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiV1EmbeddingStatus {
    /// Provider answered a probe.
    Ready,
    /// Provider did not answer.
    Unavailable,
}

/// Embedding section of the health payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1EmbeddingHealthDto {
    /// Model identifier.
    pub model: String,
    /// Output dimension.
    pub dimension: u32,
    /// Readiness.
    pub status: ApiV1EmbeddingStatus,
}

/// Per-collection statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1CollectionInfoDto {
    /// Collection name.
    pub name: String,
    /// Store status label.
    pub status: String,
    /// Stored points.
    pub points_count: u64,
    /// Indexed vectors.
    pub vectors_count: u64,
    /// Storage segments.
    pub segments_count: u64,
    /// Bytes on disk.
    pub disk_data_size: u64,
    /// Bytes in memory.
    pub ram_data_size: u64,
    /// Configured vector dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_size: Option<u32>,
    /// Configured distance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

/// Totals across every collection (`GET /collections`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1CollectionStatsDto {
    /// Number of collections.
    pub total_collections: u64,
    /// Sum of vector counts.
    pub total_vectors: u64,
    /// Sum of on-disk sizes.
    pub total_disk_size: u64,
    /// Sum of in-memory sizes.
    pub total_ram_size: u64,
    /// Per-collection statistics.
    pub collections: Vec<ApiV1CollectionInfoDto>,
}

/// Non-secret configuration echoed by `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1ServiceConfigDto {
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Vector dimension.
    pub vector_dimension: u32,
    /// Vector store endpoint.
    pub vector_store_url: String,
}

/// Aggregate of one timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1TimerDto {
    /// Samples.
    pub count: u64,
    /// Sum of samples.
    pub total_ms: u64,
    /// Largest sample.
    pub max_ms: u64,
}

/// In-process metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1MetricsDto {
    /// Counter totals.
    pub counters: BTreeMap<String, u64>,
    /// Timer aggregates.
    pub timers: BTreeMap<String, ApiV1TimerDto>,
}

/// `systemInfo` section of the health payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1SystemInfoDto {
    /// Configuration summary.
    pub config: ApiV1ServiceConfigDto,
    /// Collection totals, when the store answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ApiV1CollectionStatsDto>,
    /// Metrics, when the telemetry sink keeps them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<ApiV1MetricsDto>,
}

/// API v1 health payload (`GET /health`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1HealthDto {
    /// Overall status.
    pub status: ApiV1HealthStatus,
    /// Whether the vector store answered.
    pub vector_store_healthy: bool,
    /// Embedding provider readiness.
    pub embedding: ApiV1EmbeddingHealthDto,
    /// Collection names the store reported.
    pub collections: Vec<String>,
    /// Configuration and stats.
    pub system_info: ApiV1SystemInfoDto,
}

/// Model identity in the benchmark payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1ModelInfoDto {
    /// Provider identifier.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Output dimension.
    pub dimension: u32,
}

/// Single-text timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1SingleEncodingDto {
    /// Milliseconds.
    pub time_ms: f64,
    /// Returned dimension.
    pub dimension: u32,
}

/// Batch timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1BatchEncodingDto {
    /// Seconds.
    pub total_time_s: f64,
    /// Throughput.
    pub texts_per_second: f64,
    /// Texts embedded.
    pub texts_count: u64,
    /// Returned dimension.
    pub dimension: u32,
}

/// API v1 benchmark payload (`GET /benchmark`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiV1BenchmarkDto {
    /// Model under test.
    pub model_info: ApiV1ModelInfoDto,
    /// Single-text timing.
    pub single_encoding: ApiV1SingleEncodingDto,
    /// Batch timing.
    pub batch_encoding: ApiV1BatchEncodingDto,
}
